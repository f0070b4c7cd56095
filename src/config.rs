use std::{
    env, fs,
    path::{Path, PathBuf},
};

use derive_builder::Builder;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    checks::CheckEnablement,
    error::Result,
    parse::DEFAULT_TRANSFORM_SUFFIXES,
    severity::Severity,
};

#[derive(Clone)]
pub struct ParsedConfigFile {
    pub path: PathBuf,
    pub content: ParsedConfigFileContent,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ParsedConfigFileContent {
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub disabled: Vec<String>,
    pub severity: Option<Severity>,
    pub transform_suffixes: Option<Vec<String>>,
}

pub fn load_config_file(path: impl AsRef<Path>) -> Result<ParsedConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let parsed: ParsedConfigFileContent = serde_yaml::from_str(&contents)
        .map_err(|error| crate::error::Error::parse(format!("couldn't parse config file: {error}")))?;
    Ok(ParsedConfigFile {
        path: path.to_owned(),
        content: parsed,
    })
}

const CONFIG_FILENAME: &str = ".sepolint.yml";

/// Search the current directory and its ancestors for a config file.
#[instrument]
pub fn find_config_file() -> Option<PathBuf> {
    let starting_directory = env::current_dir().ok()?;
    starting_directory
        .ancestors()
        .map(|directory| directory.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

/// The merged run configuration: config-file layers below, command-line
/// layers on top.
#[derive(Builder, Clone)]
#[builder(default, setter(into))]
pub struct Config {
    /// Weakest severity to report.
    pub level: Severity,
    pub enablement: CheckEnablement,
    pub verbose: bool,
    /// Policy-tree roots to walk for `.te`/`.if`/`.fc` files.
    pub paths: Vec<PathBuf>,
    pub transform_suffixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Severity::Convention,
            enablement: CheckEnablement::default(),
            verbose: false,
            paths: Vec::new(),
            transform_suffixes: DEFAULT_TRANSFORM_SUFFIXES
                .iter()
                .map(|suffix| (*suffix).to_owned())
                .collect(),
        }
    }
}
