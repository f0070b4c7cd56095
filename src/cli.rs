use std::path::PathBuf;

use clap::Parser;

use crate::{
    checks::CheckEnablement,
    config::{find_config_file, load_config_file, Config, ParsedConfigFileContent},
    error::Result,
    parse::DEFAULT_TRANSFORM_SUFFIXES,
    severity::Severity,
};

#[derive(Parser)]
#[command(name = "sepolint", version, about = "Static linter for SELinux-style policy source trees")]
pub struct Args {
    /// Weakest severity to report (C, S, W, E or F)
    #[arg(short = 'l', long = "level")]
    pub level: Option<Severity>,

    /// Enable a check, overriding every other layer (repeatable)
    #[arg(short = 'e', long = "enable")]
    pub enable: Vec<String>,

    /// Disable a check (repeatable)
    #[arg(short = 'd', long = "disable")]
    pub disable: Vec<String>,

    /// Run only the checks passed via --enable
    #[arg(short = 'o', long)]
    pub only_enabled: bool,

    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Config file to use instead of searching for .sepolint.yml
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Root of the policy source tree
    pub paths: Vec<PathBuf>,
}

impl Args {
    /// Layer the config file under the command-line flags.
    pub fn load_config_file_and_into_config(self) -> Result<Config> {
        let content = match &self.config {
            Some(path) => load_config_file(path)?.content,
            None => match find_config_file() {
                Some(path) => load_config_file(path)?.content,
                None => ParsedConfigFileContent::default(),
            },
        };

        let level = self
            .level
            .or(content.severity)
            .unwrap_or(Severity::Convention);
        let enablement = CheckEnablement {
            config_enabled: content.enabled.into(),
            config_disabled: content.disabled.into(),
            cl_enabled: self.enable.into(),
            cl_disabled: self.disable.into(),
            only_enabled: self.only_enabled,
        };
        let transform_suffixes = content.transform_suffixes.unwrap_or_else(|| {
            DEFAULT_TRANSFORM_SUFFIXES
                .iter()
                .map(|suffix| (*suffix).to_owned())
                .collect()
        });
        let paths = if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths
        };

        Ok(Config {
            level,
            enablement,
            verbose: self.verbose,
            paths,
            transform_suffixes,
        })
    }
}
