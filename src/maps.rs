use std::collections::HashMap;

use crate::{
    strings::StringList,
    template::{TemplateBody, TemplateItem},
    tree::DeclKind,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclRecord {
    pub module: String,
    pub kind: DeclKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub module: String,
    pub transform: bool,
    pub filetrans: bool,
    pub role: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModuleEnablement {
    Base,
    Module,
    Off,
}

impl ModuleEnablement {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleEnablement::Base => "base",
            ModuleEnablement::Module => "module",
            ModuleEnablement::Off => "off",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "base" => Some(ModuleEnablement::Base),
            "module" => Some(ModuleEnablement::Module),
            "off" => Some(ModuleEnablement::Off),
            _ => None,
        }
    }
}

/// The owned analysis context: every process-scope fact accumulated while
/// parsing and queried while checking.
///
/// Empty at program start, mutated only by the parse builder and the startup
/// loaders, read-only during checking, cleared exactly once at end of run.
/// On duplicate insert the first writer wins, except module enablement where
/// a later setting overrides.
#[derive(Default)]
pub struct Analysis {
    module_name: Option<String>,
    decl_map: HashMap<String, DeclRecord>,
    ifs_map: HashMap<String, InterfaceRecord>,
    template_map: HashMap<String, TemplateBody>,
    mods_map: HashMap<String, ModuleEnablement>,
    permmacros_map: HashMap<String, StringList>,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_module_name(&mut self, name: impl Into<String>) {
        self.module_name = Some(name.into());
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    pub fn insert_decl(&mut self, name: impl Into<String>, module: impl Into<String>, kind: DeclKind) {
        self.decl_map.entry(name.into()).or_insert_with(|| DeclRecord {
            module: module.into(),
            kind,
        });
    }

    /// Owning module for `name`, if declared with the given kind.
    pub fn lookup_decl(&self, name: &str, kind: DeclKind) -> Option<&str> {
        self.decl_map
            .get(name)
            .filter(|record| record.kind == kind)
            .map(|record| record.module.as_str())
    }

    pub fn decl_record(&self, name: &str) -> Option<&DeclRecord> {
        self.decl_map.get(name)
    }

    pub fn decl_count(&self, kind: DeclKind) -> usize {
        self.decl_map
            .values()
            .filter(|record| record.kind == kind)
            .count()
    }

    pub fn insert_interface(&mut self, name: impl Into<String>, module: impl Into<String>) {
        self.ifs_map.entry(name.into()).or_insert_with(|| InterfaceRecord {
            module: module.into(),
            ..Default::default()
        });
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceRecord> {
        self.ifs_map.get(name)
    }

    pub fn mark_transform_if(&mut self, name: &str) {
        if let Some(record) = self.ifs_map.get_mut(name) {
            record.transform = true;
        }
    }

    pub fn mark_filetrans_if(&mut self, name: &str) {
        if let Some(record) = self.ifs_map.get_mut(name) {
            record.filetrans = true;
        }
    }

    pub fn mark_role_if(&mut self, name: &str) {
        if let Some(record) = self.ifs_map.get_mut(name) {
            record.role = true;
        }
    }

    pub fn interface_count(&self) -> usize {
        self.ifs_map.len()
    }

    pub fn insert_template(&mut self, name: impl Into<String>) {
        self.template_map.entry(name.into()).or_default();
    }

    pub fn insert_decl_into_template(
        &mut self,
        template: &str,
        kind: DeclKind,
        name: impl Into<String>,
    ) {
        self.template_map
            .entry(template.to_owned())
            .or_default()
            .items
            .push(TemplateItem::Decl {
                kind,
                name: name.into(),
            });
    }

    pub fn insert_call_into_template(
        &mut self,
        template: &str,
        name: impl Into<String>,
        args: StringList,
    ) {
        self.template_map
            .entry(template.to_owned())
            .or_default()
            .items
            .push(TemplateItem::Call {
                name: name.into(),
                args,
            });
    }

    pub fn template(&self, name: &str) -> Option<&TemplateBody> {
        self.template_map.get(name)
    }

    pub fn template_count(&self) -> usize {
        self.template_map.len()
    }

    pub fn set_module_enablement(&mut self, name: impl Into<String>, enablement: ModuleEnablement) {
        self.mods_map.insert(name.into(), enablement);
    }

    pub fn module_enablement(&self, name: &str) -> Option<ModuleEnablement> {
        self.mods_map.get(name).copied()
    }

    pub fn mods_count(&self) -> usize {
        self.mods_map.len()
    }

    pub fn insert_permmacro(&mut self, name: impl Into<String>, perms: StringList) {
        self.permmacros_map.entry(name.into()).or_insert(perms);
    }

    pub fn permmacro(&self, name: &str) -> Option<&StringList> {
        self.permmacros_map.get(name)
    }

    pub fn permmacro_count(&self) -> usize {
        self.permmacros_map.len()
    }

    /// Tear down every map. Safe to call more than once; the second call is
    /// a no-op on already-empty state.
    pub fn cleanup(&mut self) {
        self.module_name = None;
        self.decl_map.clear();
        self.ifs_map.clear();
        self.template_map.clear();
        self.mods_map.clear();
        self.permmacros_map.clear();
    }
}
