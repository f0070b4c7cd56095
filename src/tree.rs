use crate::strings::StringList;

/// Handle to a node in a [`PolicyTree`] arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Type,
    Attribute,
    Role,
    Class,
    Perm,
    User,
    Bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AvRuleKind {
    Allow,
    AuditAllow,
    DontAudit,
    NeverAllow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Type,
    Role,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclData {
    pub kind: DeclKind,
    pub name: String,
    pub attrs: Option<StringList>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvRuleData {
    pub kind: AvRuleKind,
    pub sources: StringList,
    pub targets: StringList,
    pub object_classes: StringList,
    pub perms: StringList,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleAllowData {
    pub from_role: String,
    pub to_role: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeTransitionData {
    pub kind: TransitionKind,
    pub sources: StringList,
    pub targets: StringList,
    pub object_classes: StringList,
    pub default_type: String,
    pub filename: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleTransitionData {
    pub sources: StringList,
    pub targets: StringList,
    pub default_role: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfCallData {
    pub name: String,
    pub args: StringList,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeAttributeData {
    pub type_name: String,
    pub attrs: StringList,
}

/// One line of a file-context labelling file. A line that failed to parse
/// becomes an `Error` node instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FcEntryData {
    pub path: String,
    pub obj_class: Option<String>,
    pub user: Option<String>,
    pub role: Option<String>,
    pub type_name: Option<String>,
    pub sensitivity: Option<String>,
}

/// Variant payload per node flavor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    TeFile(String),
    IfFile(String),
    FcFile(String),
    Comment,
    Semicolon,
    StartBlock,
    Cleanup,
    Error,
    Decl(DeclData),
    Alias(String),
    TypeAlias(String),
    AvRule(AvRuleData),
    RoleAllow(RoleAllowData),
    TypeTransition(TypeTransitionData),
    RoleTransition(RoleTransitionData),
    IfCall(IfCallData),
    InterfaceDef(String),
    TemplateDef(String),
    Require,
    GenRequire,
    OptionalPolicy,
    OptionalElse,
    TunablePolicy,
    Ifdef,
    Permissive(String),
    TypeAttribute(TypeAttributeData),
    FcEntry(FcEntryData),
}

/// Fieldless flavor tag, used as the check-dispatch key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TeFile,
    IfFile,
    FcFile,
    Comment,
    Semicolon,
    StartBlock,
    Cleanup,
    Error,
    Decl,
    Alias,
    TypeAlias,
    AvRule,
    RoleAllow,
    TypeTransition,
    RoleTransition,
    IfCall,
    InterfaceDef,
    TemplateDef,
    Require,
    GenRequire,
    OptionalPolicy,
    OptionalElse,
    TunablePolicy,
    Ifdef,
    Permissive,
    TypeAttribute,
    FcEntry,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::TeFile(_) => NodeKind::TeFile,
            NodeData::IfFile(_) => NodeKind::IfFile,
            NodeData::FcFile(_) => NodeKind::FcFile,
            NodeData::Comment => NodeKind::Comment,
            NodeData::Semicolon => NodeKind::Semicolon,
            NodeData::StartBlock => NodeKind::StartBlock,
            NodeData::Cleanup => NodeKind::Cleanup,
            NodeData::Error => NodeKind::Error,
            NodeData::Decl(_) => NodeKind::Decl,
            NodeData::Alias(_) => NodeKind::Alias,
            NodeData::TypeAlias(_) => NodeKind::TypeAlias,
            NodeData::AvRule(_) => NodeKind::AvRule,
            NodeData::RoleAllow(_) => NodeKind::RoleAllow,
            NodeData::TypeTransition(_) => NodeKind::TypeTransition,
            NodeData::RoleTransition(_) => NodeKind::RoleTransition,
            NodeData::IfCall(_) => NodeKind::IfCall,
            NodeData::InterfaceDef(_) => NodeKind::InterfaceDef,
            NodeData::TemplateDef(_) => NodeKind::TemplateDef,
            NodeData::Require => NodeKind::Require,
            NodeData::GenRequire => NodeKind::GenRequire,
            NodeData::OptionalPolicy => NodeKind::OptionalPolicy,
            NodeData::OptionalElse => NodeKind::OptionalElse,
            NodeData::TunablePolicy => NodeKind::TunablePolicy,
            NodeData::Ifdef => NodeKind::Ifdef,
            NodeData::Permissive(_) => NodeKind::Permissive,
            NodeData::TypeAttribute(_) => NodeKind::TypeAttribute,
            NodeData::FcEntry(_) => NodeKind::FcEntry,
        }
    }
}

pub struct PolicyNode {
    pub data: NodeData,
    pub lineno: u32,
    /// Comma-separated check ids silenced at this node by an in-source
    /// `selint-disable:` annotation.
    pub exceptions: Option<String>,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    first_child: Option<NodeId>,
}

impl PolicyNode {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

/// The uniform syntactic tree for one parsed file.
///
/// Nodes live in an arena and link to each other by index: a doubly-linked
/// sibling list plus parent and first-child links. The arena is the single
/// owner of every node, so parent/prev back-references carry no ownership
/// and dropping the tree releases each subtree exactly once.
pub struct PolicyTree {
    nodes: Vec<PolicyNode>,
    root: NodeId,
}

impl PolicyTree {
    pub fn new(root_data: NodeData, lineno: u32) -> Self {
        let root = PolicyNode {
            data: root_data,
            lineno,
            exceptions: None,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &PolicyNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PolicyNode {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    fn alloc(&mut self, data: NodeData, lineno: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PolicyNode {
            data,
            lineno,
            exceptions: None,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
        });
        id
    }

    /// Append a sibling after `cursor`; `cursor` itself is unchanged.
    pub fn insert_next(&mut self, cursor: NodeId, data: NodeData, lineno: u32) -> NodeId {
        let id = self.alloc(data, lineno);
        let old_next = self.nodes[cursor.0].next;
        self.nodes[id.0].parent = self.nodes[cursor.0].parent;
        self.nodes[id.0].prev = Some(cursor);
        self.nodes[id.0].next = old_next;
        self.nodes[cursor.0].next = Some(id);
        if let Some(old_next) = old_next {
            self.nodes[old_next.0].prev = Some(id);
        }
        id
    }

    /// Set `cursor`'s first child, or append to the tail of its child chain.
    pub fn insert_child(&mut self, cursor: NodeId, data: NodeData, lineno: u32) -> NodeId {
        let id = self.alloc(data, lineno);
        self.nodes[id.0].parent = Some(cursor);
        match self.nodes[cursor.0].first_child {
            None => {
                self.nodes[cursor.0].first_child = Some(id);
            }
            Some(first) => {
                let mut tail = first;
                while let Some(next) = self.nodes[tail.0].next {
                    tail = next;
                }
                self.nodes[tail.0].next = Some(id);
                self.nodes[id.0].prev = Some(tail);
            }
        }
        id
    }

    /// Depth-first successor: first child, else next sibling, else the next
    /// sibling of the nearest ancestor that has one.
    pub fn dfs_next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(child) = self.nodes[id.0].first_child {
            return Some(child);
        }
        let mut current = id;
        loop {
            if let Some(next) = self.nodes[current.0].next {
                return Some(next);
            }
            current = self.nodes[current.0].parent?;
        }
    }

    /// Walk the whole tree in depth-first source order.
    pub fn iter_dfs(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self.root);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.dfs_next(current);
            Some(current)
        })
    }

    /// Every node strictly below `id`, in depth-first source order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        if let Some(child) = self.first_child(id) {
            stack.push(child);
        }
        while let Some(current) = stack.pop() {
            result.push(current);
            if let Some(next) = self.next_sibling(current) {
                stack.push(next);
            }
            if let Some(child) = self.first_child(current) {
                stack.push(child);
            }
        }
        result
    }

    /// True iff the node has an ancestor that is a require or gen-require
    /// block.
    pub fn is_in_require(&self, id: NodeId) -> bool {
        let mut current = self.nodes[id.0].parent;
        while let Some(ancestor) = current {
            match self.nodes[ancestor.0].data {
                NodeData::Require | NodeData::GenRequire => return true,
                _ => {}
            }
            current = self.nodes[ancestor.0].parent;
        }
        false
    }

    /// Name of the enclosing template definition, if any ancestor is one.
    pub fn name_if_in_template(&self, id: NodeId) -> Option<&str> {
        let mut current = self.nodes[id.0].parent;
        while let Some(ancestor) = current {
            if let NodeData::TemplateDef(name) = &self.nodes[ancestor.0].data {
                return Some(name);
            }
            current = self.nodes[ancestor.0].parent;
        }
        None
    }

    /// Name of the parent node if it is an interface definition. The builder
    /// heuristics only look at the immediate parent block.
    pub fn parent_interface_name(&self, id: NodeId) -> Option<&str> {
        let parent = self.nodes[id.0].parent?;
        match &self.nodes[parent.0].data {
            NodeData::InterfaceDef(name) => Some(name),
            _ => None,
        }
    }

    /// True iff the node has an ancestor of the given kind.
    pub fn has_ancestor_of_kind(&self, id: NodeId, kind: NodeKind) -> bool {
        let mut current = self.nodes[id.0].parent;
        while let Some(ancestor) = current {
            if self.nodes[ancestor.0].kind() == kind {
                return true;
            }
            current = self.nodes[ancestor.0].parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
