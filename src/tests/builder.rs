use crate::{
    error::Error,
    maps::Analysis,
    parse::builder::ParseBuilder,
    strings::StringList,
    tree::{AvRuleKind, DeclKind, NodeData, NodeKind},
};

fn te_builder(analysis: &mut Analysis) -> ParseBuilder<'_> {
    analysis.set_module_name("foo");
    ParseBuilder::new(analysis, NodeData::TeFile("foo".to_owned()), 1)
}

#[test]
fn declaration_outside_require_lands_in_decl_map() {
    let mut analysis = Analysis::new();
    let mut builder = te_builder(&mut analysis);
    builder
        .insert_declaration(DeclKind::Type, "foo_t", None, 3)
        .unwrap();
    drop(builder);

    assert_eq!(analysis.lookup_decl("foo_t", DeclKind::Type), Some("foo"));
}

#[test]
fn declaration_without_module_name_is_an_error() {
    let mut analysis = Analysis::new();
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::TeFile("foo".to_owned()), 1);
    let result = builder.insert_declaration(DeclKind::Type, "foo_t", None, 1);
    assert!(matches!(result, Err(Error::NoModName)));
}

#[test]
fn declaration_inside_require_is_a_reference() {
    let mut analysis = Analysis::new();
    let mut builder = te_builder(&mut analysis);
    builder.begin_require(2).unwrap();
    builder
        .insert_declaration(DeclKind::Type, "bar_t", None, 3)
        .unwrap();
    builder.end_require().unwrap();
    drop(builder);

    assert_eq!(analysis.lookup_decl("bar_t", DeclKind::Type), None);
}

#[test]
fn declaration_inside_template_goes_to_template_map() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    builder.begin_interface_def(true, "foo_template", 1).unwrap();
    builder
        .insert_declaration(DeclKind::Type, "$1_t", None, 2)
        .unwrap();
    builder.end_interface_def().unwrap();
    drop(builder);

    assert_eq!(analysis.lookup_decl("$1_t", DeclKind::Type), None);
    let body = analysis.template("foo_template").unwrap();
    assert_eq!(body.items.len(), 1);
}

#[test]
fn role_association_in_template_is_not_recorded() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    builder.begin_interface_def(true, "foo_template", 1).unwrap();
    builder
        .insert_declaration(
            DeclKind::Role,
            "staff_r",
            Some(StringList::from(vec!["foo_t"])),
            2,
        )
        .unwrap();
    builder.end_interface_def().unwrap();
    drop(builder);

    assert!(analysis.template("foo_template").unwrap().items.is_empty());
}

#[test]
fn role_declaration_with_dollar_attrs_marks_role_interface() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    builder.begin_interface_def(false, "foo_role", 1).unwrap();
    builder
        .insert_declaration(
            DeclKind::Role,
            "system_r",
            Some(StringList::from(vec!["$1"])),
            2,
        )
        .unwrap();
    builder.end_interface_def().unwrap();
    drop(builder);

    assert!(analysis.interface("foo_role").unwrap().role);
}

#[test]
fn av_rule_with_associate_marks_transform_interface() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    builder.begin_interface_def(false, "foo_domtrans", 1).unwrap();
    builder
        .insert_av_rule(
            AvRuleKind::Allow,
            StringList::from(vec!["$1"]),
            StringList::from(vec!["foo_t"]),
            StringList::from(vec!["filesystem"]),
            StringList::from(vec!["associate"]),
            2,
        )
        .unwrap();
    builder.end_interface_def().unwrap();
    drop(builder);

    assert!(analysis.interface("foo_domtrans").unwrap().transform);
}

#[test]
fn type_transition_without_process_class_marks_filetrans() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    builder.begin_interface_def(false, "foo_filetrans", 1).unwrap();
    builder
        .insert_type_transition(
            crate::tree::TransitionKind::Type,
            StringList::from(vec!["$1"]),
            StringList::from(vec!["foo_log_t"]),
            StringList::from(vec!["file"]),
            "foo_var_log_t",
            None,
            2,
        )
        .unwrap();
    builder.end_interface_def().unwrap();
    drop(builder);

    assert!(analysis.interface("foo_filetrans").unwrap().filetrans);
}

#[test]
fn filetrans_pattern_call_marks_filetrans() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    builder.begin_interface_def(false, "foo_stuff", 1).unwrap();
    builder
        .insert_interface_call(
            "filetrans_pattern",
            StringList::from(vec!["$1", "foo_t", "file"]),
            2,
        )
        .unwrap();
    builder.end_interface_def().unwrap();
    drop(builder);

    assert!(analysis.interface("foo_stuff").unwrap().filetrans);
}

#[test]
fn aliases_become_children_of_the_declaration() {
    let mut analysis = Analysis::new();
    let mut builder = te_builder(&mut analysis);
    builder
        .insert_declaration(DeclKind::Type, "foo_t", None, 2)
        .unwrap();
    builder
        .insert_aliases(StringList::from(vec!["foo_alias_t", "bar_alias_t"]), DeclKind::Type, 2)
        .unwrap();

    let tree = builder.finish();
    let decl = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::Decl)
        .unwrap();
    let children = tree.descendants(decl);
    assert_eq!(children.len(), 2);
    assert!(children
        .iter()
        .all(|&id| tree.node(id).kind() == NodeKind::Alias));

    assert_eq!(
        analysis.lookup_decl("foo_alias_t", DeclKind::Type),
        Some("foo")
    );
    assert_eq!(
        analysis.lookup_decl("bar_alias_t", DeclKind::Type),
        Some("foo")
    );
}

#[test]
fn block_nodes_get_a_start_block_sentinel() {
    let mut analysis = Analysis::new();
    let mut builder = te_builder(&mut analysis);
    builder.begin_optional_policy(2).unwrap();
    builder.insert_semicolon(3).unwrap();
    builder.end_optional_policy().unwrap();

    let tree = builder.finish();
    let block = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::OptionalPolicy)
        .unwrap();
    let first_child = tree.first_child(block).unwrap();
    assert_eq!(tree.node(first_child).kind(), NodeKind::StartBlock);
}

#[test]
fn end_block_of_the_wrong_kind_is_not_in_block() {
    let mut analysis = Analysis::new();
    let mut builder = te_builder(&mut analysis);
    builder.begin_optional_policy(2).unwrap();
    assert!(matches!(
        builder.end_tunable_policy(),
        Err(Error::NotInBlock)
    ));
    builder.end_optional_policy().unwrap();
}

#[test]
fn end_interface_def_retries_as_template_close() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    let mut builder = ParseBuilder::new(&mut analysis, NodeData::IfFile("foo".to_owned()), 1);
    builder.begin_interface_def(true, "foo_template", 1).unwrap();
    builder.end_interface_def().unwrap();
}

#[test]
fn save_command_attaches_exceptions_to_the_comment() {
    let mut analysis = Analysis::new();
    let mut builder = te_builder(&mut analysis);
    builder.insert_comment(4).unwrap();
    builder.save_command("# selint-disable:S-003,W-001").unwrap();

    let tree = builder.finish();
    let comment = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::Comment)
        .unwrap();
    assert_eq!(
        tree.node(comment).exceptions.as_deref(),
        Some("S-003,W-001")
    );
}

#[test]
fn save_command_rejects_unknown_annotations() {
    let mut analysis = Analysis::new();
    let mut builder = te_builder(&mut analysis);
    builder.insert_comment(4).unwrap();
    assert!(builder.save_command("# selint-enable:S-003").is_err());
}
