use sepolint::{
    load_access_vectors, load_modules_source, Analysis, DeclKind, Error,
};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/sample_policy/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_load_access_vectors_normal() {
    let mut analysis = Analysis::new();
    load_access_vectors(fixture("access_vectors"), &mut analysis).unwrap();

    assert_eq!(analysis.decl_count(DeclKind::Class), 3);
    assert_eq!(analysis.decl_count(DeclKind::Perm), 37);

    assert_eq!(analysis.lookup_decl("file", DeclKind::Class), Some("class"));
    assert_eq!(analysis.lookup_decl("append", DeclKind::Perm), Some("perm"));
    assert_eq!(analysis.lookup_decl("listen", DeclKind::Perm), Some("perm"));
    assert_eq!(analysis.lookup_decl("use", DeclKind::Perm), Some("perm"));

    analysis.cleanup();
}

#[test]
fn test_load_modules_source() {
    let mut analysis = Analysis::new();
    let result = load_modules_source(fixture("modules.conf"), &mut analysis);
    assert!(result.is_ok());

    assert_eq!(
        analysis.module_enablement("sysadm").unwrap().as_str(),
        "base"
    );
    assert_eq!(
        analysis.module_enablement("sudo").unwrap().as_str(),
        "module"
    );
    assert_eq!(analysis.module_enablement("games").unwrap().as_str(), "off");

    analysis.cleanup();

    let result = load_modules_source(fixture("bad_modules.conf"), &mut analysis);
    assert!(matches!(result, Err(Error::ParseError(_))));
    assert_eq!(analysis.mods_count(), 0);

    analysis.cleanup();
}
