use crate::{
    parse::fc::parse_fc_source,
    tree::{NodeData, NodeKind},
};

fn entries(tree: &crate::tree::PolicyTree) -> Vec<crate::tree::FcEntryData> {
    tree.iter_dfs()
        .filter_map(|id| match &tree.node(id).data {
            NodeData::FcEntry(entry) => Some(entry.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn plain_context_entry() {
    let tree = parse_fc_source("/usr/bin/foo\t--\tsystem_u:object_r:foo_exec_t:s0\n", "foo");
    let parsed = entries(&tree);
    assert_eq!(parsed.len(), 1);
    let entry = &parsed[0];
    assert_eq!(entry.path, "/usr/bin/foo");
    assert_eq!(entry.obj_class.as_deref(), Some("--"));
    assert_eq!(entry.user.as_deref(), Some("system_u"));
    assert_eq!(entry.role.as_deref(), Some("object_r"));
    assert_eq!(entry.type_name.as_deref(), Some("foo_exec_t"));
    assert_eq!(entry.sensitivity.as_deref(), Some("s0"));
}

#[test]
fn gen_context_entry() {
    let tree = parse_fc_source(
        "/var/log/foo(/.*)?\tgen_context(system_u:object_r:foo_log_t,s0)\n",
        "foo",
    );
    let parsed = entries(&tree);
    assert_eq!(parsed.len(), 1);
    let entry = &parsed[0];
    assert_eq!(entry.obj_class, None);
    assert_eq!(entry.type_name.as_deref(), Some("foo_log_t"));
    assert_eq!(entry.sensitivity.as_deref(), Some("s0"));
}

#[test]
fn none_context_has_no_fields() {
    let tree = parse_fc_source("/dev/foo\t-c\t<<none>>\n", "foo");
    let parsed = entries(&tree);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].user, None);
    assert_eq!(parsed[0].type_name, None);
}

#[test]
fn bad_line_becomes_an_error_node() {
    let tree = parse_fc_source("/usr/bin/foo\n", "foo");
    let kinds: Vec<NodeKind> = tree.iter_dfs().map(|id| tree.node(id).kind()).collect();
    assert!(kinds.contains(&NodeKind::Error));
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let source = "\
# labels for foo

/usr/bin/foo -- gen_context(system_u:object_r:foo_exec_t,s0)
";
    let tree = parse_fc_source(source, "foo");
    let kinds: Vec<NodeKind> = tree.iter_dfs().map(|id| tree.node(id).kind()).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::FcFile, NodeKind::Comment, NodeKind::FcEntry]
    );
    assert_eq!(tree.node(tree.iter_dfs().last().unwrap()).lineno, 3);
}

#[test]
fn disable_annotation_is_carried_by_the_comment() {
    let source = "\
# selint-disable:E-005
/usr/bin/foo -- gen_context(system_u:object_r:foo_exec_t,s0)
";
    let tree = parse_fc_source(source, "foo");
    let comment = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::Comment)
        .unwrap();
    assert_eq!(tree.node(comment).exceptions.as_deref(), Some("E-005"));
}
