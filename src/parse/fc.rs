//! Line-oriented parser for file-context labelling files. Unlike the policy
//! grammar this one recovers from bad input: a line that does not parse
//! becomes an error node for E-002 to report.

use crate::tree::{FcEntryData, NodeData, PolicyTree};

/// Parse a whole `.fc` source into a tree rooted at a file-context file node.
pub fn parse_fc_source(source: &str, module_name: &str) -> PolicyTree {
    let mut tree = PolicyTree::new(NodeData::FcFile(module_name.to_owned()), 1);
    let mut cursor = tree.root();

    for (index, raw_line) in source.lines().enumerate() {
        let lineno = (index + 1) as u32;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            cursor = tree.insert_next(cursor, NodeData::Comment, lineno);
            if let Some(position) = comment.find("selint-disable:") {
                let csv = comment[position + "selint-disable:".len()..].trim().to_owned();
                tree.node_mut(cursor).exceptions = Some(csv);
            }
            continue;
        }
        // m4 conditionals wrapping blocks of entries are not modelled
        if line.starts_with("ifdef(")
            || line.starts_with("ifndef(")
            || line.starts_with("')")
            || line == "'"
        {
            continue;
        }

        let data = match parse_fc_line(line) {
            Some(entry) => NodeData::FcEntry(entry),
            None => NodeData::Error,
        };
        cursor = tree.insert_next(cursor, data, lineno);
    }

    tree
}

fn parse_fc_line(line: &str) -> Option<FcEntryData> {
    let mut fields = line.split_whitespace();

    let path = fields.next()?.to_owned();
    let mut rest: Vec<&str> = fields.collect();
    if rest.is_empty() {
        return None;
    }

    let mut obj_class = None;
    if rest[0].starts_with('-') {
        if rest[0].len() != 2 {
            return None;
        }
        obj_class = Some(rest[0].to_owned());
        rest.remove(0);
    }

    let context = rest.join("");
    if context.is_empty() {
        return None;
    }
    if context == "<<none>>" {
        return Some(FcEntryData {
            path,
            obj_class,
            ..Default::default()
        });
    }

    let (context_str, gen_sensitivity) =
        if let Some(inner) = context.strip_prefix("gen_context(").and_then(|s| s.strip_suffix(')')) {
            let mut parts = inner.splitn(2, ',');
            let context_str = parts.next()?.to_owned();
            (context_str, parts.next().map(|s| s.trim().to_owned()))
        } else {
            (context, None)
        };

    let mut parts = context_str.split(':');
    let user = parts.next()?.to_owned();
    let role = parts.next()?.to_owned();
    let type_name = parts.next()?.to_owned();
    let sensitivity = parts.next().map(str::to_owned).or(gen_sensitivity);
    if user.is_empty() || role.is_empty() || type_name.is_empty() {
        return None;
    }

    Some(FcEntryData {
        path,
        obj_class,
        user: Some(user),
        role: Some(role),
        type_name: Some(type_name),
        sensitivity,
    })
}
