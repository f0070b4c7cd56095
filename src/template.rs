use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{maps::Analysis, strings::StringList, tree::DeclKind};

/// Ordered record of what a template body does: the declarations it makes
/// and the interface calls it performs, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateBody {
    pub items: Vec<TemplateItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateItem {
    Decl { kind: DeclKind, name: String },
    Call { name: String, args: StringList },
}

static POSITIONAL_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([1-9])").unwrap());

/// Substitute `$1`..`$9` in `text` from the positional call arguments.
/// A position with no corresponding argument substitutes to empty.
fn substitute_args(text: &str, args: &StringList) -> String {
    POSITIONAL_ARG
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let position: usize = caps[1].parse().unwrap();
            args.get(position - 1).unwrap_or("").to_owned()
        })
        .into_owned()
}

/// Expand the declarations a call to `template_name` makes, inserting each
/// into the declaration map owned by the caller's module.
///
/// A recorded call to another template is a nested template, whose behaviour
/// is undefined; it is flagged with an internal diagnostic and skipped.
pub fn add_template_declarations(
    analysis: &mut Analysis,
    template_name: &str,
    args: &StringList,
    caller_module: &str,
) {
    let Some(body) = analysis.template(template_name) else {
        return;
    };

    let mut decls: Vec<(DeclKind, String)> = Vec::new();
    let mut skipped_nested: Vec<String> = Vec::new();
    for item in &body.items {
        match item {
            TemplateItem::Decl { kind, name } => {
                decls.push((*kind, substitute_args(name, args)));
            }
            TemplateItem::Call { name, .. } => {
                // A recorded call to a plain interface declares nothing.
                if analysis.template(name).is_some() {
                    skipped_nested.push(name.clone());
                }
            }
        }
    }

    for nested in skipped_nested {
        debug!(
            template = template_name,
            nested = nested.as_str(),
            "nested template call left unexpanded"
        );
    }

    for (kind, name) in decls {
        if !name.is_empty() {
            analysis.insert_decl(name, caller_module, kind);
        }
    }
}
