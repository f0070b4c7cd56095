//! Loaders for the vendor inputs consulted before any policy file is
//! parsed: the access-vector definitions, the modules configuration, and
//! the permission-set macros.

use std::{fs, path::Path};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    error::{Error, Result},
    maps::{Analysis, ModuleEnablement},
    strings::StringList,
    tree::DeclKind,
};

/// Load the kernel access-vector definitions. Classes land in the
/// declaration map under the pseudo-module `class`, permissions under
/// `perm`, so checks can resolve object classes and permission names the
/// same way they resolve types.
pub fn load_access_vectors(path: impl AsRef<Path>, analysis: &mut Analysis) -> Result<()> {
    let source = fs::read_to_string(path)?;
    load_access_vectors_source(&source, analysis);
    Ok(())
}

pub fn load_access_vectors_source(source: &str, analysis: &mut Analysis) {
    let mut tokens = source
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);

    let mut in_perm_block = false;
    while let Some(token) = tokens.next() {
        match token {
            "{" => in_perm_block = true,
            "}" => in_perm_block = false,
            "common" => {
                // common permission groups are not object classes
                tokens.next();
            }
            "class" => {
                if let Some(name) = tokens.next() {
                    analysis.insert_decl(name, "class", DeclKind::Class);
                }
            }
            "inherits" => {
                tokens.next();
            }
            perm if in_perm_block => {
                analysis.insert_decl(perm, "perm", DeclKind::Perm);
            }
            other => {
                debug!(token = other, "skipping unrecognized access-vector token");
            }
        }
    }
}

/// Load `modules.conf`. A malformed line is a parse error and leaves the
/// enablement map untouched; the whole file is validated before any entry
/// is committed.
pub fn load_modules_source(path: impl AsRef<Path>, analysis: &mut Analysis) -> Result<()> {
    let source = fs::read_to_string(path)?;
    load_modules_source_str(&source, analysis)
}

pub fn load_modules_source_str(source: &str, analysis: &mut Analysis) -> Result<()> {
    let mut entries: Vec<(String, ModuleEnablement)> = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let lineno = index + 1;
        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| Error::parse(format!("malformed modules.conf line {lineno}")))?;
        let name = name.trim();
        let value = value.trim().trim_end_matches(';').trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Error::parse(format!("malformed modules.conf line {lineno}")));
        }
        let enablement = ModuleEnablement::parse(value)
            .ok_or_else(|| Error::parse(format!("bad enablement '{value}' on modules.conf line {lineno}")))?;
        entries.push((name.to_owned(), enablement));
    }

    for (name, enablement) in entries {
        analysis.set_module_enablement(name, enablement);
    }
    Ok(())
}

static PERM_MACRO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"define\(`([A-Za-z0-9_]+)',\s*`([^']*)'").unwrap());

/// Load permission-set macros (`define(` ... `)` blocks in the support
/// file). The expansion is stored verbatim; nested macro references stay
/// unexpanded.
pub fn load_obj_perm_sets(path: impl AsRef<Path>, analysis: &mut Analysis) -> Result<()> {
    let source = fs::read_to_string(path)?;
    load_obj_perm_sets_source(&source, analysis);
    Ok(())
}

pub fn load_obj_perm_sets_source(source: &str, analysis: &mut Analysis) {
    for captures in PERM_MACRO.captures_iter(source) {
        let name = &captures[1];
        let perms: StringList = captures[2]
            .split_whitespace()
            .filter(|token| *token != "{" && *token != "}")
            .map(str::to_owned)
            .collect();
        analysis.insert_permmacro(name, perms);
    }
}
