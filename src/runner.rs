//! The pipeline driver: file discovery and ordering, the two parse passes,
//! interface-flag consolidation, the per-file check walks, and teardown.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info_span, instrument};

use crate::{
    checks::{CheckData, CheckRegistry, FileFlavor},
    config::Config,
    error::{Error, Result},
    findings::{FindingRecord, IssueCounts},
    maps::Analysis,
    parse::{builder::ParseBuilder, fc::parse_fc_source, policy::parse_policy},
    severity::Severity,
    tree::{NodeData, PolicyTree},
};

pub struct PolicyFile {
    pub path: PathBuf,
    pub tree: PolicyTree,
}

pub struct RunStatus {
    pub findings: Vec<FindingRecord>,
    pub issue_counts: IssueCounts,
    pub internal_error: bool,
}

#[derive(Default)]
struct FileSet {
    te_files: Vec<PathBuf>,
    if_files: Vec<PathBuf>,
    fc_files: Vec<PathBuf>,
    context_files: Vec<PathBuf>,
    modules_conf: Option<PathBuf>,
    access_vectors: Option<PathBuf>,
    obj_perm_sets: Option<PathBuf>,
}

fn discover_files(roots: &[PathBuf]) -> Result<FileSet> {
    let mut set = FileSet::default();
    for root in roots {
        walk(root, &mut set)?;
    }
    Ok(set)
}

fn walk(path: &Path, set: &mut FileSet) -> Result<()> {
    if path.is_dir() {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .collect();
        entries.sort();
        for entry in entries {
            walk(&entry, set)?;
        }
        return Ok(());
    }

    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
    match file_name {
        "modules.conf" => set.modules_conf = Some(path.to_owned()),
        "access_vectors" => set.access_vectors = Some(path.to_owned()),
        "obj_perm_sets.spt" => set.obj_perm_sets = Some(path.to_owned()),
        _ => match path.extension().and_then(|ext| ext.to_str()) {
            Some("te") => set.te_files.push(path.to_owned()),
            Some("if") => set.if_files.push(path.to_owned()),
            Some("fc") => set.fc_files.push(path.to_owned()),
            Some("spt") => set.context_files.push(path.to_owned()),
            _ => {}
        },
    }
    Ok(())
}

fn module_name_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("")
        .to_owned()
}

fn basename_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .to_owned()
}

/// Run the whole analysis. Findings are printed as they are emitted and
/// returned for the caller's exit-code decision; the symbol maps are torn
/// down on every path out.
#[instrument(skip_all)]
pub fn run_analysis(config: &Config) -> RunStatus {
    let mut analysis = Analysis::new();
    let mut registry = CheckRegistry::register_checks(config.level, &config.enablement);
    let mut findings: Vec<FindingRecord> = Vec::new();

    let result = run_phases(config, &mut analysis, &mut registry, &mut findings);

    let mut internal_error = registry.saw_internal_error();
    match result {
        Ok(()) => {}
        Err(Error::ParseError(_)) => {
            // the F-001 finding for the offending file is already out
        }
        Err(error) => {
            let record = FindingRecord {
                filename: "sepolint".to_owned(),
                lineno: 0,
                severity: Severity::Fatal,
                check_id: "F-002".to_owned(),
                message: error.to_string(),
            };
            record.print();
            findings.push(record);
            internal_error = true;
        }
    }

    analysis.cleanup();

    RunStatus {
        findings,
        issue_counts: std::mem::take(registry.issue_counts_mut()),
        internal_error,
    }
}

fn run_phases(
    config: &Config,
    analysis: &mut Analysis,
    registry: &mut CheckRegistry,
    findings: &mut Vec<FindingRecord>,
) -> Result<()> {
    let files = discover_files(&config.paths)?;

    if let Some(path) = &files.access_vectors {
        debug!(path = %path.display(), "loading access vectors");
        crate::startup::load_access_vectors(path, analysis)?;
    }
    if let Some(path) = &files.modules_conf {
        debug!(path = %path.display(), "loading modules.conf");
        crate::startup::load_modules_source(path, analysis)?;
    }
    if let Some(path) = &files.obj_perm_sets {
        debug!(path = %path.display(), "loading permission-set macros");
        crate::startup::load_obj_perm_sets(path, analysis)?;
    }

    // Interface and context files come first so that checks on
    // type-enforcement files can resolve cross-file references.
    let if_files = parse_policy_files(config, analysis, findings, &files.if_files, FileFlavor::If)?;
    let _context_files =
        parse_policy_files(config, analysis, findings, &files.context_files, FileFlavor::If)?;

    mark_transform_interfaces(&if_files, analysis);

    let te_files = parse_policy_files(config, analysis, findings, &files.te_files, FileFlavor::Te)?;

    let mut fc_files = Vec::with_capacity(files.fc_files.len());
    for path in &files.fc_files {
        if config.verbose {
            println!("Parsing fc file {}", path.display());
        }
        let source = fs::read_to_string(path)?;
        fc_files.push(PolicyFile {
            path: path.clone(),
            tree: parse_fc_source(&source, &module_name_of(path)),
        });
    }

    run_all_checks(registry, analysis, FileFlavor::Te, &te_files, findings);
    run_all_checks(registry, analysis, FileFlavor::If, &if_files, findings);
    run_all_checks(registry, analysis, FileFlavor::Fc, &fc_files, findings);

    Ok(())
}

fn parse_policy_files(
    config: &Config,
    analysis: &mut Analysis,
    findings: &mut Vec<FindingRecord>,
    paths: &[PathBuf],
    flavor: FileFlavor,
) -> Result<Vec<PolicyFile>> {
    let mut parsed = Vec::with_capacity(paths.len());
    for path in paths {
        if config.verbose {
            println!("Parsing {}", path.display());
        }
        match parse_one_file(config, analysis, path, flavor) {
            Ok(tree) => parsed.push(PolicyFile {
                path: path.clone(),
                tree,
            }),
            Err(error) => {
                let record = FindingRecord {
                    filename: basename_of(path),
                    lineno: 1,
                    severity: Severity::Fatal,
                    check_id: "F-001".to_owned(),
                    message: format!("Policy syntax error: {error}"),
                };
                record.print();
                findings.push(record);
                return Err(Error::parse(format!("failed to parse {}", path.display())));
            }
        }
    }
    Ok(parsed)
}

fn parse_one_file(
    config: &Config,
    analysis: &mut Analysis,
    path: &Path,
    flavor: FileFlavor,
) -> Result<PolicyTree> {
    let source = fs::read_to_string(path)?;
    let module_name = module_name_of(path);
    analysis.set_module_name(&module_name);

    let root_data = match flavor {
        FileFlavor::Te => NodeData::TeFile(module_name),
        _ => NodeData::IfFile(module_name),
    };
    let mut builder = ParseBuilder::with_transform_suffixes(
        analysis,
        root_data,
        1,
        config.transform_suffixes.clone(),
    );
    parse_policy(&source, &mut builder)?;
    Ok(builder.finish())
}

/// Consolidate transform flags: an interface that hands a parameter to an
/// already-transform interface grants the same privilege, so the flag
/// propagates through call chains until nothing changes.
fn mark_transform_interfaces(if_files: &[PolicyFile], analysis: &mut Analysis) {
    loop {
        let mut changed = false;
        for file in if_files {
            for node in file.tree.iter_dfs() {
                let NodeData::InterfaceDef(name) = &file.tree.node(node).data else {
                    continue;
                };
                if analysis.interface(name).is_some_and(|record| record.transform) {
                    continue;
                }
                let calls_transform = file.tree.descendants(node).into_iter().any(|id| {
                    matches!(
                        &file.tree.node(id).data,
                        NodeData::IfCall(call)
                            if analysis.interface(&call.name).is_some_and(|record| record.transform)
                                && call.args.iter().any(|arg| arg.starts_with('$'))
                    )
                });
                if calls_transform {
                    analysis.mark_transform_if(name);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

fn run_all_checks(
    registry: &mut CheckRegistry,
    analysis: &Analysis,
    flavor: FileFlavor,
    files: &[PolicyFile],
    findings: &mut Vec<FindingRecord>,
) {
    for file in files {
        let data = CheckData {
            mod_name: module_name_of(&file.path),
            filename: basename_of(&file.path),
            flavor,
        };
        run_checks_on_one_file(registry, analysis, &data, &file.tree, findings);
    }
}

fn run_checks_on_one_file(
    registry: &mut CheckRegistry,
    analysis: &Analysis,
    data: &CheckData,
    tree: &PolicyTree,
    findings: &mut Vec<FindingRecord>,
) {
    let span = info_span!("checking file", file = data.filename.as_str()).entered();

    for node in tree.iter_dfs() {
        for record in registry.call_checks(data, analysis, tree, node) {
            record.print();
            findings.push(record);
        }
    }

    // Give checks a chance to clean up per-file state.
    let cleanup = PolicyTree::new(NodeData::Cleanup, 0);
    for record in registry.call_checks(data, analysis, &cleanup, cleanup.root()) {
        record.print();
        findings.push(record);
    }

    span.exit();
}
