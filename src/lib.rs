mod checks;
mod cli;
mod config;
mod error;
mod findings;
mod maps;
mod parse;
mod runner;
mod severity;
mod startup;
mod strings;
mod template;
#[cfg(test)]
mod tests;
mod tree;

pub use checks::{
    is_check_enabled, CheckData, CheckDef, CheckEnablement, CheckFn, CheckRegistry, FileFlavor,
    CHECK_TABLE,
};
pub use cli::Args;
pub use config::{
    find_config_file, load_config_file, Config, ConfigBuilder, ParsedConfigFile,
    ParsedConfigFileContent,
};
pub use error::{Error, Result};
pub use findings::{Finding, FindingRecord, IssueCounts};
pub use maps::{Analysis, DeclRecord, InterfaceRecord, ModuleEnablement};
pub use parse::{
    builder::ParseBuilder, fc::parse_fc_source, policy::parse_policy, DEFAULT_TRANSFORM_SUFFIXES,
};
pub use runner::{run_analysis, PolicyFile, RunStatus};
pub use severity::Severity;
pub use startup::{
    load_access_vectors, load_access_vectors_source, load_modules_source,
    load_modules_source_str, load_obj_perm_sets, load_obj_perm_sets_source,
};
pub use strings::StringList;
pub use template::{add_template_declarations, TemplateBody, TemplateItem};
pub use tree::{
    AvRuleData, AvRuleKind, DeclData, DeclKind, FcEntryData, IfCallData, NodeData, NodeId,
    NodeKind, PolicyNode, PolicyTree, RoleAllowData, RoleTransitionData, TransitionKind,
    TypeAttributeData, TypeTransitionData,
};

pub enum ExitStatus {
    Ok,
    FoundIssues,
    InternalError,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Ok => 0,
            ExitStatus::FoundIssues => 1,
            ExitStatus::InternalError => 2,
        }
    }
}

/// Run the full analysis, print findings and the summary, and report the
/// exit status: clean, findings at error strength or above, or an internal
/// failure.
pub fn run_and_output(config: Config) -> ExitStatus {
    let status = run_analysis(&config);

    status.issue_counts.display_summary();

    if status.internal_error {
        return ExitStatus::InternalError;
    }
    if status
        .findings
        .iter()
        .any(|finding| finding.severity >= Severity::Error)
    {
        return ExitStatus::FoundIssues;
    }
    ExitStatus::Ok
}
