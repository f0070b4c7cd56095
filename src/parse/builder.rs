use crate::{
    error::{Error, Result},
    maps::Analysis,
    strings::StringList,
    template::add_template_declarations,
    tree::{
        AvRuleData, AvRuleKind, DeclData, DeclKind, IfCallData, NodeData, NodeId, NodeKind,
        PolicyTree, RoleAllowData, RoleTransitionData, TransitionKind, TypeAttributeData,
        TypeTransitionData,
    },
};

/// Interface-name suffixes that conventionally indicate a domain-transform
/// interface. Overridable from the config file.
pub const DEFAULT_TRANSFORM_SUFFIXES: &[&str] = &[
    "_domtrans",
    "_run",
    "_auto_trans",
    "_spec_domtrans",
    "_script_run",
];

/// The only code that constructs policy nodes and writes to the symbol maps.
///
/// The scanner/grammar layer drives these operations; the builder holds the
/// under-construction tree and the current insertion cursor, and advances the
/// cursor as it appends.
pub struct ParseBuilder<'a> {
    tree: PolicyTree,
    cursor: NodeId,
    analysis: &'a mut Analysis,
    transform_suffixes: Vec<String>,
}

impl<'a> ParseBuilder<'a> {
    pub fn new(analysis: &'a mut Analysis, root_data: NodeData, lineno: u32) -> Self {
        Self::with_transform_suffixes(
            analysis,
            root_data,
            lineno,
            DEFAULT_TRANSFORM_SUFFIXES
                .iter()
                .map(|suffix| (*suffix).to_owned())
                .collect(),
        )
    }

    pub fn with_transform_suffixes(
        analysis: &'a mut Analysis,
        root_data: NodeData,
        lineno: u32,
        transform_suffixes: Vec<String>,
    ) -> Self {
        let tree = PolicyTree::new(root_data, lineno);
        let cursor = tree.root();
        Self {
            tree,
            cursor,
            analysis,
            transform_suffixes,
        }
    }

    /// Hand back the finished tree. The symbol maps stay alive in the
    /// analysis context for later files.
    pub fn finish(self) -> PolicyTree {
        self.tree
    }

    pub fn tree(&self) -> &PolicyTree {
        &self.tree
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    fn insert_and_advance(&mut self, data: NodeData, lineno: u32) -> NodeId {
        let id = self.tree.insert_next(self.cursor, data, lineno);
        self.cursor = id;
        id
    }

    fn has_transform_suffix(&self, name: &str) -> bool {
        self.transform_suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// True iff the permission list grants `associate` or `mounton`, either
    /// literally or through a permission-set macro expansion.
    fn grants_associate_or_mounton(&self, perms: &StringList) -> bool {
        perms.iter().any(|perm| {
            perm == "associate"
                || perm == "mounton"
                || self
                    .analysis
                    .permmacro(perm)
                    .is_some_and(|expanded| {
                        expanded.contains_str("associate") || expanded.contains_str("mounton")
                    })
        })
    }

    pub fn insert_comment(&mut self, lineno: u32) -> Result<()> {
        self.insert_and_advance(NodeData::Comment, lineno);
        Ok(())
    }

    /// Attach a `selint-disable:<csv>` annotation carried by the comment the
    /// cursor points at. An annotation at the end of a statement line also
    /// lands on that statement's node.
    pub fn save_command(&mut self, command: &str) -> Result<()> {
        let trimmed = command.trim_start_matches(|c: char| c == '#' || c.is_whitespace());
        let rest = trimmed
            .strip_prefix("selint-")
            .ok_or_else(|| Error::parse(format!("unrecognized annotation '{trimmed}'")))?;
        let csv = rest
            .strip_prefix("disable:")
            .ok_or_else(|| Error::parse(format!("unrecognized annotation 'selint-{rest}'")))?
            .trim()
            .to_owned();

        let lineno = self.tree.node(self.cursor).lineno;
        self.tree.node_mut(self.cursor).exceptions = Some(csv.clone());
        if let Some(prev) = self.tree.prev_sibling(self.cursor) {
            if self.tree.node(prev).lineno == lineno {
                self.tree.node_mut(prev).exceptions = Some(csv);
            }
        }
        Ok(())
    }

    pub fn insert_declaration(
        &mut self,
        kind: DeclKind,
        name: &str,
        attrs: Option<StringList>,
        lineno: u32,
    ) -> Result<()> {
        if !self.tree.is_in_require(self.cursor) {
            // Inside a require block the names are references, not
            // declarations, so nothing is recorded.
            if let Some(template) = self.tree.name_if_in_template(self.cursor).map(str::to_owned) {
                // A role declaration with attributes inside a template is a
                // role-type association, not a declaration.
                if !(kind == DeclKind::Role && attrs.is_some()) {
                    self.analysis.insert_decl_into_template(&template, kind, name);
                }
            } else if !name.starts_with('$') {
                let module = self
                    .analysis
                    .module_name()
                    .ok_or(Error::NoModName)?
                    .to_owned();
                self.analysis.insert_decl(name, module, kind);
            }
        }

        if kind == DeclKind::Role {
            if let Some(interface) = self.tree.parent_interface_name(self.cursor).map(str::to_owned)
            {
                // Role interfaces are the ones where the types are passed in,
                // not the roles.
                if attrs
                    .as_ref()
                    .is_some_and(|attrs| attrs.iter().any(|attr| attr.starts_with('$')))
                {
                    self.analysis.mark_role_if(&interface);
                }
            }
        }

        self.insert_and_advance(
            NodeData::Decl(DeclData {
                kind,
                name: name.to_owned(),
                attrs,
            }),
            lineno,
        );
        Ok(())
    }

    /// Record each alias like a declaration and hang one alias node per name
    /// off the declaration node the cursor points at.
    pub fn insert_aliases(
        &mut self,
        aliases: StringList,
        kind: DeclKind,
        lineno: u32,
    ) -> Result<()> {
        for alias in &aliases {
            if let Some(template) = self.tree.name_if_in_template(self.cursor).map(str::to_owned) {
                self.analysis
                    .insert_decl_into_template(&template, kind, alias.as_str());
            } else {
                let module = self
                    .analysis
                    .module_name()
                    .ok_or(Error::NoModName)?
                    .to_owned();
                self.analysis.insert_decl(alias.as_str(), module, kind);
            }
            self.tree
                .insert_child(self.cursor, NodeData::Alias(alias.clone()), lineno);
        }
        Ok(())
    }

    pub fn insert_type_alias(&mut self, type_name: &str, lineno: u32) -> Result<()> {
        self.insert_and_advance(NodeData::TypeAlias(type_name.to_owned()), lineno);
        Ok(())
    }

    pub fn insert_av_rule(
        &mut self,
        kind: AvRuleKind,
        sources: StringList,
        targets: StringList,
        object_classes: StringList,
        perms: StringList,
        lineno: u32,
    ) -> Result<()> {
        if let Some(interface) = self.tree.parent_interface_name(self.cursor).map(str::to_owned) {
            if self.has_transform_suffix(&interface) && self.grants_associate_or_mounton(&perms) {
                self.analysis.mark_transform_if(&interface);
            }
        }

        self.insert_and_advance(
            NodeData::AvRule(AvRuleData {
                kind,
                sources,
                targets,
                object_classes,
                perms,
            }),
            lineno,
        );
        Ok(())
    }

    pub fn insert_role_allow(&mut self, from_role: &str, to_role: &str, lineno: u32) -> Result<()> {
        self.insert_and_advance(
            NodeData::RoleAllow(RoleAllowData {
                from_role: from_role.to_owned(),
                to_role: to_role.to_owned(),
            }),
            lineno,
        );
        Ok(())
    }

    pub fn insert_type_transition(
        &mut self,
        kind: TransitionKind,
        sources: StringList,
        targets: StringList,
        object_classes: StringList,
        default_type: &str,
        filename: Option<&str>,
        lineno: u32,
    ) -> Result<()> {
        if !object_classes.contains_str("process") {
            if let Some(interface) =
                self.tree.parent_interface_name(self.cursor).map(str::to_owned)
            {
                self.analysis.mark_filetrans_if(&interface);
            }
        }

        self.insert_and_advance(
            NodeData::TypeTransition(TypeTransitionData {
                kind,
                sources,
                targets,
                object_classes,
                default_type: default_type.to_owned(),
                filename: filename.map(str::to_owned),
            }),
            lineno,
        );
        Ok(())
    }

    pub fn insert_role_transition(
        &mut self,
        sources: StringList,
        targets: StringList,
        default_role: &str,
        lineno: u32,
    ) -> Result<()> {
        self.insert_and_advance(
            NodeData::RoleTransition(RoleTransitionData {
                sources,
                targets,
                default_role: default_role.to_owned(),
            }),
            lineno,
        );
        Ok(())
    }

    pub fn insert_interface_call(
        &mut self,
        if_name: &str,
        args: StringList,
        lineno: u32,
    ) -> Result<()> {
        if let Some(template) = self.tree.name_if_in_template(self.cursor).map(str::to_owned) {
            self.analysis
                .insert_call_into_template(&template, if_name, args.clone());
        } else if let Some(module) = self.analysis.module_name().map(str::to_owned) {
            add_template_declarations(self.analysis, if_name, &args, &module);
        }

        if if_name == "filetrans_pattern" {
            if let Some(interface) =
                self.tree.parent_interface_name(self.cursor).map(str::to_owned)
            {
                self.analysis.mark_filetrans_if(&interface);
            }
        }

        self.insert_and_advance(
            NodeData::IfCall(IfCallData {
                name: if_name.to_owned(),
                args,
            }),
            lineno,
        );
        Ok(())
    }

    pub fn insert_permissive(&mut self, domain: &str, lineno: u32) -> Result<()> {
        self.insert_and_advance(NodeData::Permissive(domain.to_owned()), lineno);
        Ok(())
    }

    pub fn insert_semicolon(&mut self, lineno: u32) -> Result<()> {
        self.insert_and_advance(NodeData::Semicolon, lineno);
        Ok(())
    }

    pub fn insert_type_attribute(
        &mut self,
        type_name: &str,
        attrs: StringList,
        lineno: u32,
    ) -> Result<()> {
        self.insert_and_advance(
            NodeData::TypeAttribute(TypeAttributeData {
                type_name: type_name.to_owned(),
                attrs,
            }),
            lineno,
        );

        if let Some(interface) = self.tree.parent_interface_name(self.cursor).map(str::to_owned) {
            if self.has_transform_suffix(&interface) {
                self.analysis.mark_transform_if(&interface);
            }
        }
        Ok(())
    }

    /// Insert the block node, give it a start-of-block sentinel child, and
    /// park the cursor on the sentinel so the block's statements become its
    /// siblings.
    fn begin_block(&mut self, data: NodeData, lineno: u32) -> Result<()> {
        self.insert_and_advance(data, lineno);
        let sentinel = self
            .tree
            .insert_child(self.cursor, NodeData::StartBlock, lineno);
        self.cursor = sentinel;
        Ok(())
    }

    fn end_block(&mut self, kind: NodeKind) -> Result<()> {
        let parent = self
            .tree
            .parent(self.cursor)
            .filter(|&parent| self.tree.node(parent).kind() == kind)
            .ok_or(Error::NotInBlock)?;
        self.cursor = parent;
        Ok(())
    }

    pub fn begin_optional_policy(&mut self, lineno: u32) -> Result<()> {
        self.begin_block(NodeData::OptionalPolicy, lineno)
    }

    pub fn end_optional_policy(&mut self) -> Result<()> {
        self.end_block(NodeKind::OptionalPolicy)
    }

    pub fn begin_optional_else(&mut self, lineno: u32) -> Result<()> {
        self.begin_block(NodeData::OptionalElse, lineno)
    }

    pub fn end_optional_else(&mut self) -> Result<()> {
        self.end_block(NodeKind::OptionalElse)
    }

    pub fn begin_tunable_policy(&mut self, lineno: u32) -> Result<()> {
        self.begin_block(NodeData::TunablePolicy, lineno)
    }

    pub fn end_tunable_policy(&mut self) -> Result<()> {
        self.end_block(NodeKind::TunablePolicy)
    }

    pub fn begin_ifdef(&mut self, lineno: u32) -> Result<()> {
        self.begin_block(NodeData::Ifdef, lineno)
    }

    pub fn end_ifdef(&mut self) -> Result<()> {
        self.end_block(NodeKind::Ifdef)
    }

    pub fn begin_require(&mut self, lineno: u32) -> Result<()> {
        self.begin_block(NodeData::Require, lineno)
    }

    pub fn end_require(&mut self) -> Result<()> {
        self.end_block(NodeKind::Require)
    }

    pub fn begin_gen_require(&mut self, lineno: u32) -> Result<()> {
        self.begin_block(NodeData::GenRequire, lineno)
    }

    pub fn end_gen_require(&mut self) -> Result<()> {
        self.end_block(NodeKind::GenRequire)
    }

    pub fn begin_interface_def(&mut self, is_template: bool, name: &str, lineno: u32) -> Result<()> {
        if is_template {
            self.analysis.insert_template(name);
        }
        let module = self
            .analysis
            .module_name()
            .ok_or(Error::NoModName)?
            .to_owned();
        self.analysis.insert_interface(name, module);

        let data = if is_template {
            NodeData::TemplateDef(name.to_owned())
        } else {
            NodeData::InterfaceDef(name.to_owned())
        };
        self.begin_block(data, lineno)
    }

    /// Interface and template definitions share a close bracket in the
    /// grammar, so a mismatched interface close retries as a template close.
    pub fn end_interface_def(&mut self) -> Result<()> {
        match self.end_block(NodeKind::InterfaceDef) {
            Err(Error::NotInBlock) => self.end_block(NodeKind::TemplateDef),
            other => other,
        }
    }
}
