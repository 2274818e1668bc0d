//! Arena-indexed field type tree.
//!
//! Nodes live in a single `Vec` owned by the tree and reference each other
//! by index, so parent back-references and the tree-wide name map never
//! form ownership cycles. The name map is owned once by the tree, giving
//! O(1) lookup regardless of nesting depth.

use std::collections::HashMap;

use crate::field::{FieldFlag, FieldKind, FieldOption, OccRange};
use crate::{AdaTypeError, AdaTypeResult};

// ── NodeId ─────────────────────────────────────────────────────────

/// Index of a field node within its [`TypeTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

// ── FieldNode ──────────────────────────────────────────────────────

/// A single field descriptor in the type tree.
///
/// Immutable after tree assembly; many value trees share one type tree
/// read-only.
#[derive(Debug, Clone)]
pub struct FieldNode {
    /// Long field name.
    pub name: String,
    /// Two-character short name.
    pub short_name: String,
    /// The field kind.
    pub kind: FieldKind,
    /// Byte length; 0 for variable-length and structural kinds.
    pub length: u32,
    /// Fractional digits for decimal kinds.
    pub fraction: u32,
    /// Nesting level (1 = top).
    pub level: u8,
    /// Occurrence hint given at construction (structural kinds).
    pub occ_hint: i32,
    /// Period-group occurrence range.
    pub pe_range: OccRange,
    /// Multiple-value occurrence range.
    pub mu_range: OccRange,
    /// Parent node, if attached.
    pub parent: Option<NodeId>,
    /// Child nodes in declaration order (structural kinds).
    pub children: Vec<NodeId>,
    options: u32,
    flags: u8,
}

impl FieldNode {
    /// Whether the given flag is set on this node.
    pub fn has_flag(&self, flag: FieldFlag) -> bool {
        self.flags & flag.bit() != 0
    }

    /// Whether the given FDT option is set on this node.
    pub fn has_option(&self, option: FieldOption) -> bool {
        self.options & option.bit() != 0
    }

    /// Set an FDT option.
    pub fn add_option(&mut self, option: FieldOption) {
        self.options |= option.bit();
    }

    /// Clear an FDT option.
    pub fn clear_option(&mut self, option: FieldOption) {
        self.options &= !option.bit();
    }

    /// Whether this node holds child fields.
    pub fn is_structure(&self) -> bool {
        self.kind.is_structure()
    }

    fn set_flag(&mut self, flag: FieldFlag) {
        self.flags |= flag.bit();
    }

    fn clear_flag(&mut self, flag: FieldFlag) {
        self.flags &= !flag.bit();
    }
}

// ── TypeTree ───────────────────────────────────────────────────────

/// The field definition tree of one record layout.
#[derive(Debug, Clone, Default)]
pub struct TypeTree {
    nodes: Vec<FieldNode>,
    names: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
}

impl TypeTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scalar field node at top level.
    pub fn new_scalar(
        &mut self,
        kind: FieldKind,
        name: impl Into<String>,
        length: u32,
    ) -> AdaTypeResult<NodeId> {
        let name = name.into();
        let short = name.chars().take(2).collect::<String>();
        self.insert(FieldNode {
            name,
            short_name: short,
            kind,
            length,
            fraction: 0,
            level: 1,
            occ_hint: 0,
            pe_range: OccRange::empty(),
            mu_range: OccRange::empty(),
            parent: None,
            children: Vec::new(),
            options: 0,
            flags: 0,
        })
    }

    /// Create a structural node (group, period group, multiple-value
    /// field) at top level.
    ///
    /// Period groups and multiple-value fields always carry an unbounded
    /// 1..N occurrence range; plain groups carry none.
    pub fn new_structure(
        &mut self,
        kind: FieldKind,
        name: impl Into<String>,
        occ_hint: i32,
    ) -> AdaTypeResult<NodeId> {
        let name = name.into();
        let short = name.chars().take(2).collect::<String>();
        let (pe_range, mu_range) = match kind {
            FieldKind::PeriodGroup => (OccRange::unbounded(), OccRange::empty()),
            FieldKind::Multiplefield => (OccRange::empty(), OccRange::unbounded()),
            _ => (OccRange::empty(), OccRange::empty()),
        };
        let id = self.insert(FieldNode {
            name,
            short_name: short,
            kind,
            length: 0,
            fraction: 0,
            level: 1,
            occ_hint,
            pe_range,
            mu_range,
            parent: None,
            children: Vec::new(),
            options: 0,
            flags: 0,
        })?;
        match kind {
            FieldKind::PeriodGroup => self.add_flag(id, FieldFlag::Pe),
            FieldKind::Multiplefield => self.add_flag(id, FieldFlag::Mu),
            _ => {}
        }
        Ok(id)
    }

    fn insert(&mut self, node: FieldNode) -> AdaTypeResult<NodeId> {
        if self.names.contains_key(&node.name) {
            return Err(AdaTypeError::DuplicateField {
                name: node.name.clone(),
            });
        }
        let id = NodeId(self.nodes.len());
        self.names.insert(node.name.clone(), id);
        self.nodes.push(node);
        self.roots.push(id);
        Ok(id)
    }

    /// Attach `child` under `parent`.
    ///
    /// Sets the child's level and parent back-reference, copies the
    /// parent's period range, and propagates flags: a period-group parent
    /// (or one already inside a period group) marks the whole child
    /// subtree PE; a multiple-value parent marks the child a ghost member,
    /// plus second-call when the MU itself sits inside a period group; an
    /// MU child marks every ancestor MU.
    pub fn add_field(&mut self, parent: NodeId, child: NodeId) -> AdaTypeResult<()> {
        if !self.nodes[parent.0].is_structure() {
            return Err(AdaTypeError::NotStructure {
                name: self.nodes[parent.0].name.clone(),
            });
        }
        tracing::debug!(
            child = %self.nodes[child.0].name,
            parent = %self.nodes[parent.0].name,
            "attach field"
        );
        let parent_level = self.nodes[parent.0].level;
        self.set_level_recursive(child, parent_level + 1);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].pe_range = self.nodes[parent.0].pe_range;
        self.roots.retain(|&r| r != child);
        self.nodes[parent.0].children.push(child);

        let parent_kind = self.nodes[parent.0].kind;
        if parent_kind == FieldKind::PeriodGroup || self.nodes[parent.0].has_flag(FieldFlag::Pe) {
            self.propagate_down(child, FieldFlag::Pe);
        }
        if parent_kind == FieldKind::Multiplefield {
            self.nodes[child.0].set_flag(FieldFlag::MuGhost);
            if self.nodes[parent.0].has_flag(FieldFlag::Pe) {
                self.nodes[child.0].set_flag(FieldFlag::SecondCall);
            }
        }
        if self.nodes[child.0].has_flag(FieldFlag::Mu)
            || self.nodes[child.0].kind == FieldKind::Multiplefield
        {
            self.add_flag(child, FieldFlag::Mu);
        }
        Ok(())
    }

    /// Detach the named field from its parent.
    ///
    /// The parent's child list is rebuilt without the field; now-empty
    /// parents are left in place. The detached subtree stays in the arena
    /// marked [`FieldFlag::ToBeRemoved`].
    pub fn remove_field(&mut self, name: &str) -> AdaTypeResult<()> {
        let id = self
            .lookup(name)
            .ok_or_else(|| AdaTypeError::FieldNotFound {
                name: name.to_string(),
            })?;
        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].children.retain(|&c| c != id);
        } else {
            self.roots.retain(|&r| r != id);
        }
        self.nodes[id.0].parent = None;
        self.nodes[id.0].set_flag(FieldFlag::ToBeRemoved);
        self.names.remove(name);
        Ok(())
    }

    /// Look up a node by long name. O(1) at any nesting depth.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &FieldNode {
        &self.nodes[id.0]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut FieldNode {
        &mut self.nodes[id.0]
    }

    /// Top-level nodes in declaration order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes in the arena (including detached ones).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set a flag on a node.
    ///
    /// [`FieldFlag::Mu`] propagates upward through all ancestors so that
    /// second-call and buffer-sizing decisions see it from any level.
    pub fn add_flag(&mut self, id: NodeId, flag: FieldFlag) {
        self.nodes[id.0].set_flag(flag);
        if flag == FieldFlag::Mu {
            let mut p = self.nodes[id.0].parent;
            while let Some(pid) = p {
                self.nodes[pid.0].set_flag(FieldFlag::Mu);
                p = self.nodes[pid.0].parent;
            }
        }
    }

    /// Clear a flag on a node.
    pub fn remove_flag(&mut self, id: NodeId, flag: FieldFlag) {
        self.nodes[id.0].clear_flag(flag);
    }

    fn propagate_down(&mut self, id: NodeId, flag: FieldFlag) {
        self.nodes[id.0].set_flag(flag);
        let children = self.nodes[id.0].children.clone();
        for c in children {
            self.propagate_down(c, flag);
        }
    }

    fn set_level_recursive(&mut self, id: NodeId, level: u8) {
        self.nodes[id.0].level = level;
        let children = self.nodes[id.0].children.clone();
        for c in children {
            self.set_level_recursive(c, level + 1);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
