//! Checks over file-context labelling entries.

use regex::Regex;

use crate::{
    checks::{CheckData, FileFlavor},
    error::Result,
    findings::Finding,
    maps::Analysis,
    severity::Severity,
    tree::{DeclKind, NodeData, NodeId, PolicyTree},
};

/// S-002: labelling with a type some other module declared.
pub fn check_file_context_types_in_mod(
    data: &CheckData,
    analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    let NodeData::FcEntry(entry) = &tree.node(node).data else {
        return Ok(None);
    };
    let Some(type_name) = entry.type_name.as_deref() else {
        return Ok(None);
    };
    let Some(module) = analysis.lookup_decl(type_name, DeclKind::Type) else {
        return Ok(None);
    };
    if module == data.mod_name {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Style,
        "S-002",
        format!("Type {type_name} is declared in module {module}, not in this module"),
    )))
}

/// W-004: the path field must be a compilable regular expression.
pub fn check_file_context_regex(
    _data: &CheckData,
    _analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    let NodeData::FcEntry(entry) = &tree.node(node).data else {
        return Ok(None);
    };
    if let Err(error) = Regex::new(&entry.path) {
        let reason = error.to_string();
        let reason = reason.lines().last().unwrap_or("").trim();
        return Ok(Some(Finding::new(
            Severity::Warning,
            "W-004",
            format!("Failed to compile path regex \"{}\": {reason}", entry.path),
        )));
    }
    Ok(None)
}

/// E-002: a line the file-context parser could not make sense of.
pub fn check_file_context_error_nodes(
    data: &CheckData,
    _analysis: &Analysis,
    _tree: &PolicyTree,
    _node: NodeId,
) -> Result<Option<Finding>> {
    if data.flavor != FileFlavor::Fc {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Error,
        "E-002",
        "Bad file context format",
    )))
}

/// E-003
pub fn check_file_context_users(
    _data: &CheckData,
    analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    let NodeData::FcEntry(entry) = &tree.node(node).data else {
        return Ok(None);
    };
    let Some(user) = entry.user.as_deref() else {
        return Ok(None);
    };
    if analysis.lookup_decl(user, DeclKind::User).is_some() {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Error,
        "E-003",
        format!("Nonexistent user ({user}) listed in fc_entry"),
    )))
}

/// E-004
pub fn check_file_context_roles(
    _data: &CheckData,
    analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    let NodeData::FcEntry(entry) = &tree.node(node).data else {
        return Ok(None);
    };
    let Some(role) = entry.role.as_deref() else {
        return Ok(None);
    };
    if analysis.lookup_decl(role, DeclKind::Role).is_some() {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Error,
        "E-004",
        format!("Nonexistent role ({role}) listed in fc_entry"),
    )))
}

/// E-005
pub fn check_file_context_types_exist(
    _data: &CheckData,
    analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    let NodeData::FcEntry(entry) = &tree.node(node).data else {
        return Ok(None);
    };
    let Some(type_name) = entry.type_name.as_deref() else {
        return Ok(None);
    };
    if analysis.lookup_decl(type_name, DeclKind::Type).is_some() {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Error,
        "E-005",
        format!("Nonexistent type ({type_name}) listed in fc_entry"),
    )))
}
