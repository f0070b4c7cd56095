//! Checks over interface and template definitions.

use crate::{
    checks::{enclosing_def, is_opaque_reference, required_names, used_names, CheckData, FileFlavor},
    error::Result,
    findings::Finding,
    maps::Analysis,
    severity::Severity,
    tree::{DeclKind, NodeData, NodeId, NodeKind, PolicyTree},
};

/// C-004: every interface or template definition wants a comment directly
/// above it describing the interface.
pub fn check_interface_definitions_have_comment(
    _data: &CheckData,
    _analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    let has_comment = tree
        .prev_sibling(node)
        .is_some_and(|prev| tree.node(prev).kind() == NodeKind::Comment);
    if has_comment {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Convention,
        "C-004",
        "Interface definitions should have comments above them",
    )))
}

/// W-002: a type used inside an interface body must be a parameter, be
/// declared by the interface itself, or appear in its require block.
pub fn check_type_used_but_not_required_in_if(
    data: &CheckData,
    _analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    if data.flavor != FileFlavor::If {
        return Ok(None);
    }
    let Some(def) = enclosing_def(tree, node) else {
        return Ok(None);
    };
    if tree.is_in_require(node) {
        return Ok(None);
    }

    let required = required_names(tree, def);
    for name in used_names(&tree.node(node).data) {
        if is_opaque_reference(&name) || !name.ends_with("_t") {
            continue;
        }
        if required.iter().any(|required| *required == name) {
            continue;
        }
        let declared_here = tree.descendants(def).into_iter().any(|id| {
            !tree.is_in_require(id)
                && matches!(&tree.node(id).data, NodeData::Decl(decl) if decl.name == name)
        });
        if declared_here {
            continue;
        }
        return Ok(Some(Finding::new(
            Severity::Warning,
            "W-002",
            format!("Type {name} is used in interface but not required"),
        )));
    }
    Ok(None)
}

/// W-003: a type required by an interface must actually be used by its body.
pub fn check_type_required_but_not_used_in_if(
    data: &CheckData,
    _analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    if data.flavor != FileFlavor::If {
        return Ok(None);
    }
    if !tree.is_in_require(node) {
        return Ok(None);
    }
    let Some(def) = enclosing_def(tree, node) else {
        return Ok(None);
    };
    let NodeData::Decl(decl) = &tree.node(node).data else {
        return Ok(None);
    };
    if !matches!(decl.kind, DeclKind::Type | DeclKind::Attribute | DeclKind::Role) {
        return Ok(None);
    }

    let used = tree.descendants(def).into_iter().any(|id| {
        !tree.is_in_require(id)
            && used_names(&tree.node(id).data)
                .iter()
                .any(|name| *name == decl.name)
    });
    if used {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Warning,
        "W-003",
        format!("Type {} is required but not used in interface", decl.name),
    )))
}
