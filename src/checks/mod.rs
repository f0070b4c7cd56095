mod fc;
mod interface;
mod te;

use std::collections::HashMap;

use itertools::Itertools;
use tracing::debug;

use crate::{
    error::Result,
    findings::{Finding, FindingRecord, IssueCounts},
    maps::Analysis,
    severity::Severity,
    strings::StringList,
    tree::{NodeData, NodeId, NodeKind, PolicyTree},
};

/// Which flavor of file the current walk is over.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileFlavor {
    Te,
    If,
    Fc,
}

/// Per-file metadata handed to every check.
#[derive(Clone, Debug)]
pub struct CheckData {
    pub mod_name: String,
    pub filename: String,
    pub flavor: FileFlavor,
}

/// A check fills out everything except the location. An `Err` is converted
/// into an F-002 finding by the dispatcher so one misbehaving check does not
/// abort the run.
pub type CheckFn = fn(&CheckData, &Analysis, &PolicyTree, NodeId) -> Result<Option<Finding>>;

pub struct CheckDef {
    pub check_id: &'static str,
    pub severity: Severity,
    pub kinds: &'static [NodeKind],
    pub function: CheckFn,
}

/// Every check the engine knows about. Registration filters this table by
/// severity level and the enablement layers.
pub static CHECK_TABLE: &[CheckDef] = &[
    CheckDef {
        check_id: "C-001",
        severity: Severity::Convention,
        kinds: &[
            NodeKind::TeFile,
            NodeKind::Decl,
            NodeKind::AvRule,
            NodeKind::IfCall,
            NodeKind::TypeTransition,
            NodeKind::Cleanup,
        ],
        function: te::check_te_order,
    },
    CheckDef {
        check_id: "C-004",
        severity: Severity::Convention,
        kinds: &[NodeKind::InterfaceDef, NodeKind::TemplateDef],
        function: interface::check_interface_definitions_have_comment,
    },
    CheckDef {
        check_id: "S-001",
        severity: Severity::Style,
        kinds: &[NodeKind::Require, NodeKind::GenRequire],
        function: te::check_require_block,
    },
    CheckDef {
        check_id: "S-002",
        severity: Severity::Style,
        kinds: &[NodeKind::FcEntry],
        function: fc::check_file_context_types_in_mod,
    },
    CheckDef {
        check_id: "S-003",
        severity: Severity::Style,
        kinds: &[NodeKind::Semicolon],
        function: te::check_useless_semicolon,
    },
    CheckDef {
        check_id: "W-001",
        severity: Severity::Warning,
        kinds: &[
            NodeKind::AvRule,
            NodeKind::IfCall,
            NodeKind::TypeTransition,
            NodeKind::TypeAttribute,
            NodeKind::Permissive,
        ],
        function: te::check_no_explicit_declaration,
    },
    CheckDef {
        check_id: "W-002",
        severity: Severity::Warning,
        kinds: &[
            NodeKind::AvRule,
            NodeKind::IfCall,
            NodeKind::TypeTransition,
            NodeKind::TypeAttribute,
            NodeKind::Permissive,
        ],
        function: interface::check_type_used_but_not_required_in_if,
    },
    CheckDef {
        check_id: "W-003",
        severity: Severity::Warning,
        kinds: &[NodeKind::Decl],
        function: interface::check_type_required_but_not_used_in_if,
    },
    CheckDef {
        check_id: "W-004",
        severity: Severity::Warning,
        kinds: &[NodeKind::FcEntry],
        function: fc::check_file_context_regex,
    },
    CheckDef {
        check_id: "W-005",
        severity: Severity::Warning,
        kinds: &[NodeKind::IfCall],
        function: te::check_module_if_call_in_optional,
    },
    CheckDef {
        check_id: "E-002",
        severity: Severity::Error,
        kinds: &[NodeKind::Error],
        function: fc::check_file_context_error_nodes,
    },
    CheckDef {
        check_id: "E-003",
        severity: Severity::Error,
        kinds: &[NodeKind::FcEntry],
        function: fc::check_file_context_users,
    },
    CheckDef {
        check_id: "E-004",
        severity: Severity::Error,
        kinds: &[NodeKind::FcEntry],
        function: fc::check_file_context_roles,
    },
    CheckDef {
        check_id: "E-005",
        severity: Severity::Error,
        kinds: &[NodeKind::FcEntry],
        function: fc::check_file_context_types_exist,
    },
];

/// The four list-driven enablement layers plus only-enabled mode. The
/// in-source layer is applied per node at dispatch time.
#[derive(Clone, Debug, Default)]
pub struct CheckEnablement {
    pub config_enabled: StringList,
    pub config_disabled: StringList,
    pub cl_enabled: StringList,
    pub cl_disabled: StringList,
    pub only_enabled: bool,
}

/// Layered enablement, lowest to highest precedence: default-enabled,
/// config disabled, config enabled, command-line disabled, command-line
/// enabled. Only-enabled mode flips the default off and honors only the
/// command-line enabled list.
pub fn is_check_enabled(check_id: &str, enablement: &CheckEnablement) -> bool {
    let mut enabled = true;

    if enablement.only_enabled {
        enabled = false;
    } else {
        if enablement.config_disabled.contains_str(check_id) {
            enabled = false;
        }
        if enablement.config_enabled.contains_str(check_id) {
            enabled = true;
        }
        if enablement.cl_disabled.contains_str(check_id) {
            enabled = false;
        }
    }

    if enablement.cl_enabled.contains_str(check_id) {
        enabled = true;
    }

    enabled
}

struct CheckEntry {
    check_id: &'static str,
    function: CheckFn,
}

/// Registry from node flavor to the checks registered for it, in
/// registration order, plus the per-check issue counters.
#[derive(Default)]
pub struct CheckRegistry {
    by_kind: HashMap<NodeKind, Vec<CheckEntry>>,
    issue_counts: IssueCounts,
    saw_internal_error: bool,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every check at or above `level` that the
    /// enablement layers leave on.
    pub fn register_checks(level: Severity, enablement: &CheckEnablement) -> Self {
        let mut registry = Self::new();
        for def in CHECK_TABLE {
            if def.severity < level {
                continue;
            }
            if !is_check_enabled(def.check_id, enablement) {
                continue;
            }
            for &kind in def.kinds {
                registry.add_check(kind, def.check_id, def.function);
            }
        }
        registry
    }

    pub fn add_check(&mut self, kind: NodeKind, check_id: &'static str, function: CheckFn) {
        self.by_kind
            .entry(kind)
            .or_default()
            .push(CheckEntry { check_id, function });
    }

    pub fn registered_count(&self, kind: NodeKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }

    pub fn issue_counts(&self) -> &IssueCounts {
        &self.issue_counts
    }

    pub fn issue_counts_mut(&mut self) -> &mut IssueCounts {
        &mut self.issue_counts
    }

    pub fn saw_internal_error(&self) -> bool {
        self.saw_internal_error
    }

    /// Run every check registered for this node's flavor, in order,
    /// honoring in-source suppression. Returns the findings for this node.
    pub fn call_checks(
        &mut self,
        data: &CheckData,
        analysis: &Analysis,
        tree: &PolicyTree,
        node: NodeId,
    ) -> Vec<FindingRecord> {
        let kind = tree.node(node).kind();
        let entries: Vec<(&'static str, CheckFn)> = match self.by_kind.get(&kind) {
            Some(entries) => entries
                .iter()
                .map(|entry| (entry.check_id, entry.function))
                .collect(),
            None => return Vec::new(),
        };

        let mut results = Vec::new();
        for (check_id, function) in entries {
            if is_suppressed_at_node(tree, node, check_id) {
                debug!(check_id, "suppressed by in-source annotation");
                continue;
            }
            let finding = match function(data, analysis, tree, node) {
                Ok(None) => continue,
                Ok(Some(finding)) => finding,
                Err(error) => {
                    self.saw_internal_error = true;
                    Finding::new(
                        Severity::Fatal,
                        "F-002",
                        format!("Internal error in check {check_id}: {error}"),
                    )
                }
            };
            self.issue_counts.record(&finding.check_id);
            results.push(FindingRecord {
                filename: data.filename.clone(),
                lineno: tree.node(node).lineno,
                severity: finding.severity,
                check_id: finding.check_id,
                message: finding.message,
            });
        }
        results
    }
}

/// The in-source enablement layer: a check is suppressed at a node when the
/// node's own `exceptions` csv lists it, or when the annotation rides on the
/// comment immediately above the node. Matching is exact and case-sensitive.
fn is_suppressed_at_node(tree: &PolicyTree, node: NodeId, check_id: &str) -> bool {
    if csv_contains(tree.node(node).exceptions.as_deref(), check_id) {
        return true;
    }
    if let Some(prev) = tree.prev_sibling(node) {
        if matches!(tree.node(prev).data, NodeData::Comment)
            && csv_contains(tree.node(prev).exceptions.as_deref(), check_id)
        {
            return true;
        }
    }
    false
}

fn csv_contains(csv: Option<&str>, check_id: &str) -> bool {
    csv.is_some_and(|csv| csv.split(',').any(|item| item.trim() == check_id))
}

/// Identifiers a node references, flattened. Interface-call arguments may be
/// brace sets joined into one string, so they are re-split here.
pub(crate) fn used_names(data: &NodeData) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    match data {
        NodeData::AvRule(av) => {
            names.extend(av.sources.iter().cloned());
            names.extend(av.targets.iter().cloned());
        }
        NodeData::TypeTransition(tt) => {
            names.extend(tt.sources.iter().cloned());
            names.extend(tt.targets.iter().cloned());
            names.push(tt.default_type.clone());
        }
        NodeData::RoleTransition(rt) => {
            names.extend(rt.sources.iter().cloned());
            names.extend(rt.targets.iter().cloned());
            names.push(rt.default_role.clone());
        }
        NodeData::RoleAllow(ra) => {
            names.push(ra.from_role.clone());
            names.push(ra.to_role.clone());
        }
        NodeData::IfCall(call) => {
            for arg in &call.args {
                names.extend(
                    arg.split_whitespace()
                        .filter(|token| *token != "{" && *token != "}")
                        .map(str::to_owned),
                );
            }
        }
        NodeData::TypeAttribute(ta) => {
            names.push(ta.type_name.clone());
            names.extend(ta.attrs.iter().cloned());
        }
        NodeData::Permissive(domain) => names.push(domain.clone()),
        _ => {}
    }
    names.into_iter().unique().collect()
}

/// References that never name a concrete declaration: positional parameters,
/// self, wildcards, complements and exclusions.
pub(crate) fn is_opaque_reference(name: &str) -> bool {
    name == "self"
        || name.starts_with('$')
        || name.starts_with('-')
        || name.starts_with('~')
        || name.starts_with('*')
}

/// Names declared inside require blocks within `scope`'s subtree.
pub(crate) fn required_names(tree: &PolicyTree, scope: NodeId) -> Vec<String> {
    tree.descendants(scope)
        .into_iter()
        .filter(|&id| tree.is_in_require(id))
        .filter_map(|id| match &tree.node(id).data {
            NodeData::Decl(decl) => Some(decl.name.clone()),
            NodeData::Alias(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

/// Nearest ancestor that is an interface or template definition.
pub(crate) fn enclosing_def(tree: &PolicyTree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.parent(node);
    while let Some(ancestor) = current {
        if matches!(
            tree.node(ancestor).kind(),
            NodeKind::InterfaceDef | NodeKind::TemplateDef
        ) {
            return Some(ancestor);
        }
        current = tree.parent(ancestor);
    }
    None
}
