//! Checks that fire on rule-and-declaration file content.

use crate::{
    checks::{is_opaque_reference, used_names, CheckData, FileFlavor},
    error::Result,
    findings::Finding,
    maps::{Analysis, ModuleEnablement},
    severity::Severity,
    tree::{NodeData, NodeId, NodeKind, PolicyTree},
};

/// C-001: declarations in a type-enforcement file belong before the rules
/// and interface calls of their block.
pub fn check_te_order(
    data: &CheckData,
    _analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    if data.flavor != FileFlavor::Te {
        return Ok(None);
    }
    if !matches!(tree.node(node).data, NodeData::Decl(_)) {
        return Ok(None);
    }
    if tree.is_in_require(node) {
        return Ok(None);
    }

    let mut current = tree.prev_sibling(node);
    while let Some(prev) = current {
        match tree.node(prev).kind() {
            NodeKind::AvRule | NodeKind::IfCall | NodeKind::TypeTransition => {
                return Ok(Some(Finding::new(
                    Severity::Convention,
                    "C-001",
                    "Declarations should occur before rules and interface calls",
                )));
            }
            _ => {}
        }
        current = tree.prev_sibling(prev);
    }
    Ok(None)
}

/// S-001: require-block hygiene. Type-enforcement files should get their
/// foreign symbols through interface calls; interface files should use
/// gen_require rather than a raw require block.
pub fn check_require_block(
    data: &CheckData,
    _analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    match data.flavor {
        FileFlavor::Te => Ok(Some(Finding::new(
            Severity::Style,
            "S-001",
            "Require block used in te file; use an interface call instead",
        ))),
        FileFlavor::If if tree.node(node).kind() == NodeKind::Require => Ok(Some(Finding::new(
            Severity::Style,
            "S-001",
            "Use gen_require instead of require",
        ))),
        _ => Ok(None),
    }
}

/// S-003
pub fn check_useless_semicolon(
    _data: &CheckData,
    _analysis: &Analysis,
    _tree: &PolicyTree,
    _node: NodeId,
) -> Result<Option<Finding>> {
    Ok(Some(Finding::new(
        Severity::Style,
        "S-003",
        "Unnecessary semicolon",
    )))
}

/// W-001: a type from another module referenced without being required in
/// this file.
pub fn check_no_explicit_declaration(
    data: &CheckData,
    analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    if data.flavor != FileFlavor::Te {
        return Ok(None);
    }

    for name in used_names(&tree.node(node).data) {
        if is_opaque_reference(&name) || !name.ends_with("_t") {
            continue;
        }
        let Some(record) = analysis.decl_record(&name) else {
            continue;
        };
        if record.module == data.mod_name {
            continue;
        }
        let required = tree
            .iter_dfs()
            .filter(|&id| tree.is_in_require(id))
            .any(|id| matches!(&tree.node(id).data, NodeData::Decl(decl) if decl.name == name));
        if required {
            continue;
        }
        return Ok(Some(Finding::new(
            Severity::Warning,
            "W-001",
            format!(
                "No explicit declaration for {} from module {}. You should access it via interface call or require block.",
                name, record.module
            ),
        )));
    }
    Ok(None)
}

/// W-005: a call to an interface defined in a loadable module belongs inside
/// an optional_policy block.
pub fn check_module_if_call_in_optional(
    data: &CheckData,
    analysis: &Analysis,
    tree: &PolicyTree,
    node: NodeId,
) -> Result<Option<Finding>> {
    let NodeData::IfCall(call) = &tree.node(node).data else {
        return Ok(None);
    };
    let Some(record) = analysis.interface(&call.name) else {
        return Ok(None);
    };
    if record.module == data.mod_name {
        return Ok(None);
    }
    if analysis.module_enablement(&record.module) != Some(ModuleEnablement::Module) {
        return Ok(None);
    }
    if tree.has_ancestor_of_kind(node, NodeKind::OptionalPolicy) {
        return Ok(None);
    }
    Ok(Some(Finding::new(
        Severity::Warning,
        "W-005",
        format!(
            "Call to interface {} defined in module {} should be inside an optional_policy block",
            call.name, record.module
        ),
    )))
}
