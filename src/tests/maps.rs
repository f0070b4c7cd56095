use crate::{
    maps::{Analysis, ModuleEnablement},
    strings::StringList,
    tree::DeclKind,
};

#[test]
fn decl_map_first_writer_wins() {
    let mut analysis = Analysis::new();
    analysis.insert_decl("foo_t", "foo", DeclKind::Type);
    analysis.insert_decl("foo_t", "bar", DeclKind::Type);

    assert_eq!(analysis.lookup_decl("foo_t", DeclKind::Type), Some("foo"));
    assert_eq!(analysis.decl_count(DeclKind::Type), 1);
}

#[test]
fn decl_lookup_is_kind_scoped() {
    let mut analysis = Analysis::new();
    analysis.insert_decl("foo_t", "foo", DeclKind::Type);

    assert_eq!(analysis.lookup_decl("foo_t", DeclKind::Role), None);
    assert_eq!(analysis.lookup_decl("bar_t", DeclKind::Type), None);
}

#[test]
fn mods_map_later_setting_overrides() {
    let mut analysis = Analysis::new();
    analysis.set_module_enablement("sudo", ModuleEnablement::Base);
    analysis.set_module_enablement("sudo", ModuleEnablement::Off);

    assert_eq!(
        analysis.module_enablement("sudo"),
        Some(ModuleEnablement::Off)
    );
}

#[test]
fn interface_flags_mark_only_existing_entries() {
    let mut analysis = Analysis::new();
    analysis.mark_transform_if("missing");
    assert!(analysis.interface("missing").is_none());

    analysis.insert_interface("foo_domtrans", "foo");
    analysis.mark_transform_if("foo_domtrans");
    analysis.mark_filetrans_if("foo_domtrans");
    let record = analysis.interface("foo_domtrans").unwrap();
    assert!(record.transform);
    assert!(record.filetrans);
    assert!(!record.role);
    assert_eq!(record.module, "foo");
}

#[test]
fn permmacro_first_writer_wins() {
    let mut analysis = Analysis::new();
    analysis.insert_permmacro("rw_file_perms", StringList::from(vec!["read", "write"]));
    analysis.insert_permmacro("rw_file_perms", StringList::from(vec!["open"]));

    let perms = analysis.permmacro("rw_file_perms").unwrap();
    assert!(perms.contains_str("read"));
    assert!(!perms.contains_str("open"));
}

#[test]
fn cleanup_is_idempotent() {
    let mut analysis = Analysis::new();
    analysis.set_module_name("foo");
    analysis.insert_decl("foo_t", "foo", DeclKind::Type);
    analysis.insert_interface("foo_read", "foo");
    analysis.set_module_enablement("foo", ModuleEnablement::Module);

    analysis.cleanup();
    assert_eq!(analysis.module_name(), None);
    assert_eq!(analysis.decl_count(DeclKind::Type), 0);
    assert_eq!(analysis.interface_count(), 0);
    assert_eq!(analysis.mods_count(), 0);

    // the second call is a no-op
    analysis.cleanup();
    assert_eq!(analysis.decl_count(DeclKind::Type), 0);
}
