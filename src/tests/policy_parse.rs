use crate::{
    maps::Analysis,
    parse::{builder::ParseBuilder, policy::parse_policy},
    tree::{DeclKind, NodeData, NodeKind, PolicyTree},
};

fn parse_te(source: &str) -> (Analysis, PolicyTree) {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::TeFile("foo".to_owned()), 1);
    parse_policy(source, &mut builder).expect("parse failed");
    let tree = builder.finish();
    (analysis, tree)
}

fn parse_if(source: &str) -> (Analysis, PolicyTree) {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    parse_policy(source, &mut builder).expect("parse failed");
    let tree = builder.finish();
    (analysis, tree)
}

fn kinds(tree: &PolicyTree) -> Vec<NodeKind> {
    tree.iter_dfs().map(|id| tree.node(id).kind()).collect()
}

#[test]
fn declarations_rules_and_calls_parse_in_order() {
    let source = "\
# foo policy
policy_module(foo, 1.0)

type foo_t;
type foo_log_t;

allow foo_t self:process signal;
foo_read(foo_t)
";
    let (analysis, tree) = parse_te(source);

    assert_eq!(
        kinds(&tree),
        vec![
            NodeKind::TeFile,
            NodeKind::Comment,
            NodeKind::IfCall,
            NodeKind::Decl,
            NodeKind::Decl,
            NodeKind::AvRule,
            NodeKind::IfCall,
        ]
    );
    assert_eq!(analysis.lookup_decl("foo_t", DeclKind::Type), Some("foo"));
    assert_eq!(
        analysis.lookup_decl("foo_log_t", DeclKind::Type),
        Some("foo")
    );
}

#[test]
fn line_numbers_follow_the_source() {
    let source = "type foo_t;\n\nallow foo_t self:file read;\n;\n";
    let (_, tree) = parse_te(source);

    let linenos: Vec<u32> = tree.iter_dfs().map(|id| tree.node(id).lineno).collect();
    assert_eq!(linenos, vec![1, 1, 3, 4]);
}

#[test]
fn av_rule_payload_carries_all_four_lists() {
    let source = "allow foo_t { bar_t baz_t }:file { read write getattr };\n";
    let (_, tree) = parse_te(source);

    let rule = tree
        .iter_dfs()
        .find_map(|id| match &tree.node(id).data {
            NodeData::AvRule(rule) => Some(rule.clone()),
            _ => None,
        })
        .unwrap();
    assert!(rule.sources.contains_str("foo_t"));
    assert!(rule.targets.contains_str("bar_t"));
    assert!(rule.targets.contains_str("baz_t"));
    assert!(rule.object_classes.contains_str("file"));
    assert_eq!(rule.perms.len(), 3);
}

#[test]
fn allow_without_a_colon_is_a_role_allow() {
    let source = "allow sysadm_r system_r;\n";
    let (_, tree) = parse_te(source);
    assert!(kinds(&tree).contains(&NodeKind::RoleAllow));
}

#[test]
fn type_with_alias_and_attributes() {
    let source = "type foo_t alias { old_foo_t older_foo_t }, domain, mydomain;\n";
    let (analysis, tree) = parse_te(source);

    let decl = tree
        .iter_dfs()
        .find_map(|id| match &tree.node(id).data {
            NodeData::Decl(decl) => Some(decl.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(decl.name, "foo_t");
    let attrs = decl.attrs.unwrap();
    assert!(attrs.contains_str("domain"));
    assert!(attrs.contains_str("mydomain"));

    assert_eq!(
        analysis.lookup_decl("old_foo_t", DeclKind::Type),
        Some("foo")
    );
    assert_eq!(
        analysis.lookup_decl("older_foo_t", DeclKind::Type),
        Some("foo")
    );
}

#[test]
fn interface_definition_builds_a_block_and_registers_the_interface() {
    let source = "\
# read foo files
interface(`foo_read',`
	gen_require(`
		type foo_t;
	')
	allow $1 foo_t:file read;
')
";
    let (analysis, tree) = parse_if(source);

    assert_eq!(
        kinds(&tree),
        vec![
            NodeKind::IfFile,
            NodeKind::Comment,
            NodeKind::InterfaceDef,
            NodeKind::StartBlock,
            NodeKind::GenRequire,
            NodeKind::StartBlock,
            NodeKind::Decl,
            NodeKind::AvRule,
        ]
    );
    assert_eq!(analysis.interface("foo_read").unwrap().module, "foo");
    // required, not declared
    assert_eq!(analysis.lookup_decl("foo_t", DeclKind::Type), None);
}

#[test]
fn template_body_is_recorded_not_declared() {
    let source = "\
# per-instance foo
template(`foo_instance_template',`
	type $1_t;
')
";
    let (analysis, _) = parse_if(source);
    assert_eq!(analysis.template_count(), 1);
    assert_eq!(analysis.lookup_decl("$1_t", DeclKind::Type), None);
}

#[test]
fn optional_policy_wraps_its_statements() {
    let source = "\
optional_policy(`
	sudo_exec(foo_t)
')
";
    let (_, tree) = parse_te(source);

    let call = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::IfCall)
        .unwrap();
    assert!(tree.has_ancestor_of_kind(call, NodeKind::OptionalPolicy));
}

#[test]
fn tunable_policy_and_ifdef_parse_as_blocks() {
    let source = "\
tunable_policy(`allow_foo_write',`
	allow foo_t bar_t:file write;
')
ifdef(`distro_redhat',`
	type foo_redhat_t;
',`
	type foo_other_t;
')
";
    let (_, tree) = parse_te(source);
    let kinds = kinds(&tree);
    assert!(kinds.contains(&NodeKind::TunablePolicy));
    assert_eq!(
        kinds.iter().filter(|&&kind| kind == NodeKind::Ifdef).count(),
        2
    );
}

#[test]
fn type_transition_with_filename() {
    let source = "type_transition foo_t bar_t:file foo_log_t \"foo.log\";\n";
    let (_, tree) = parse_te(source);

    let transition = tree
        .iter_dfs()
        .find_map(|id| match &tree.node(id).data {
            NodeData::TypeTransition(tt) => Some(tt.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(transition.default_type, "foo_log_t");
    assert_eq!(transition.filename.as_deref(), Some("foo.log"));
}

#[test]
fn garbage_is_a_parse_error() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::TeFile("foo".to_owned()), 1);
    assert!(parse_policy("type ;;;", &mut builder).is_err());
}

#[test]
fn disable_annotation_lands_on_the_comment_node() {
    let source = "# selint-disable:S-003\n;\n";
    let (_, tree) = parse_te(source);

    let comment = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::Comment)
        .unwrap();
    assert_eq!(tree.node(comment).exceptions.as_deref(), Some("S-003"));
}
