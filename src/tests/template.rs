use crate::{
    maps::Analysis,
    strings::StringList,
    template::add_template_declarations,
    tree::DeclKind,
};

#[test]
fn call_arguments_substitute_into_recorded_declarations() {
    let mut analysis = Analysis::new();
    analysis.insert_template("foo_template");
    analysis.insert_decl_into_template("foo_template", DeclKind::Type, "$1_t");
    analysis.insert_decl_into_template("foo_template", DeclKind::Type, "$1_$2_t");

    add_template_declarations(
        &mut analysis,
        "foo_template",
        &StringList::from(vec!["alpha", "log"]),
        "caller",
    );

    assert_eq!(
        analysis.lookup_decl("alpha_t", DeclKind::Type),
        Some("caller")
    );
    assert_eq!(
        analysis.lookup_decl("alpha_log_t", DeclKind::Type),
        Some("caller")
    );
}

#[test]
fn missing_argument_positions_substitute_to_nothing() {
    let mut analysis = Analysis::new();
    analysis.insert_template("foo_template");
    analysis.insert_decl_into_template("foo_template", DeclKind::Type, "$2_t");

    add_template_declarations(
        &mut analysis,
        "foo_template",
        &StringList::from(vec!["alpha"]),
        "caller",
    );

    assert_eq!(analysis.lookup_decl("_t", DeclKind::Type), Some("caller"));
}

#[test]
fn call_to_unknown_template_declares_nothing() {
    let mut analysis = Analysis::new();
    add_template_declarations(
        &mut analysis,
        "no_such_template",
        &StringList::from(vec!["alpha"]),
        "caller",
    );
    assert_eq!(analysis.decl_count(DeclKind::Type), 0);
}

#[test]
fn nested_template_calls_are_left_unexpanded() {
    let mut analysis = Analysis::new();
    analysis.insert_template("inner_template");
    analysis.insert_decl_into_template("inner_template", DeclKind::Type, "$1_inner_t");
    analysis.insert_template("outer_template");
    analysis.insert_decl_into_template("outer_template", DeclKind::Type, "$1_outer_t");
    analysis.insert_call_into_template(
        "outer_template",
        "inner_template",
        StringList::from(vec!["$1"]),
    );

    add_template_declarations(
        &mut analysis,
        "outer_template",
        &StringList::from(vec!["alpha"]),
        "caller",
    );

    assert_eq!(
        analysis.lookup_decl("alpha_outer_t", DeclKind::Type),
        Some("caller")
    );
    assert_eq!(analysis.lookup_decl("alpha_inner_t", DeclKind::Type), None);
}
