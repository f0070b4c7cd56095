use crate::tree::{NodeData, NodeKind, PolicyTree};

fn sample_tree() -> PolicyTree {
    // te_file
    //   (siblings) comment, decl-block..., require { start_block, comment }
    let mut tree = PolicyTree::new(NodeData::TeFile("foo".to_owned()), 1);
    let root = tree.root();
    let comment = tree.insert_next(root, NodeData::Comment, 1);
    let require = tree.insert_next(comment, NodeData::Require, 2);
    let start = tree.insert_child(require, NodeData::StartBlock, 2);
    tree.insert_next(start, NodeData::Comment, 3);
    tree.insert_next(require, NodeData::Semicolon, 5);
    tree
}

#[test]
fn insert_next_links_siblings_both_ways() {
    let mut tree = PolicyTree::new(NodeData::TeFile("foo".to_owned()), 1);
    let root = tree.root();
    let first = tree.insert_next(root, NodeData::Comment, 2);
    let second = tree.insert_next(first, NodeData::Semicolon, 3);

    assert_eq!(tree.next_sibling(root), Some(first));
    assert_eq!(tree.prev_sibling(first), Some(root));
    assert_eq!(tree.next_sibling(first), Some(second));
    assert_eq!(tree.prev_sibling(second), Some(first));
    assert_eq!(tree.next_sibling(second), None);
}

#[test]
fn insert_next_in_the_middle_relinks_the_old_next() {
    let mut tree = PolicyTree::new(NodeData::TeFile("foo".to_owned()), 1);
    let root = tree.root();
    let first = tree.insert_next(root, NodeData::Comment, 2);
    let third = tree.insert_next(first, NodeData::Semicolon, 4);
    let second = tree.insert_next(first, NodeData::Comment, 3);

    assert_eq!(tree.next_sibling(first), Some(second));
    assert_eq!(tree.next_sibling(second), Some(third));
    assert_eq!(tree.prev_sibling(third), Some(second));
}

#[test]
fn insert_child_sets_first_child_then_appends_to_tail() {
    let mut tree = PolicyTree::new(NodeData::Require, 1);
    let root = tree.root();
    let first = tree.insert_child(root, NodeData::StartBlock, 1);
    let second = tree.insert_child(root, NodeData::Comment, 2);

    assert_eq!(tree.first_child(root), Some(first));
    assert_eq!(tree.next_sibling(first), Some(second));
    assert_eq!(tree.parent(first), Some(root));
    assert_eq!(tree.parent(second), Some(root));
}

#[test]
fn dfs_visits_every_node_exactly_once() {
    let tree = sample_tree();
    let visited: Vec<_> = tree.iter_dfs().collect();
    assert_eq!(visited.len(), tree.len());

    let mut deduped = visited.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), visited.len());
}

#[test]
fn dfs_order_is_source_order() {
    let tree = sample_tree();
    let kinds: Vec<NodeKind> = tree
        .iter_dfs()
        .map(|id| tree.node(id).kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::TeFile,
            NodeKind::Comment,
            NodeKind::Require,
            NodeKind::StartBlock,
            NodeKind::Comment,
            NodeKind::Semicolon,
        ]
    );

    let linenos: Vec<u32> = tree.iter_dfs().map(|id| tree.node(id).lineno).collect();
    let mut sorted = linenos.clone();
    sorted.sort_unstable();
    assert_eq!(linenos, sorted);
}

#[test]
fn is_in_require_sees_through_nesting() {
    let tree = sample_tree();
    let require = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::Require)
        .unwrap();
    let inner_comment = tree
        .iter_dfs()
        .filter(|&id| tree.node(id).kind() == NodeKind::Comment)
        .last()
        .unwrap();

    assert!(tree.is_in_require(inner_comment));
    assert!(!tree.is_in_require(require));
    assert!(!tree.is_in_require(tree.root()));
}

#[test]
fn descendants_covers_the_subtree_only() {
    let tree = sample_tree();
    let require = tree
        .iter_dfs()
        .find(|&id| tree.node(id).kind() == NodeKind::Require)
        .unwrap();
    let descendants = tree.descendants(require);
    assert_eq!(descendants.len(), 2);
    assert!(descendants
        .iter()
        .all(|&id| tree.parent(id) == Some(require)));
}
