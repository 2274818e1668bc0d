//! Result records.
//!
//! A [`Record`] owns one value tree built from a shared field type tree
//! plus the record's ISN and quantity as returned by the nucleus. Field
//! access goes through a flattened name lookup built once per record;
//! ghost members of multiple-value fields are excluded, their container
//! carries the data. Occurrence addressing is 1-based, matching the
//! occurrence ranges in format buffers.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::BytesMut;

use adalink_types::{
    AdaTypeError, BufferCursor, Endian, FieldFlag, FieldKind, Native, TypeTree, Value, ValueData,
};

use crate::AdaTcpResult;

/// One result record of a database call.
#[derive(Debug, Clone)]
pub struct Record {
    /// Internal sequence number, zero while unassigned.
    pub isn: u64,
    /// Record quantity reported by the call.
    pub quantity: u64,
    tree: Arc<TypeTree>,
    values: Vec<Value>,
    lookup: HashMap<String, Vec<usize>>,
}

impl Record {
    /// A zeroed record over `tree`.
    pub fn new(tree: Arc<TypeTree>) -> Self {
        let values = tree
            .roots()
            .iter()
            .map(|&root| Value::from_type(&tree, root))
            .collect();
        let mut lookup = HashMap::new();
        for (index, &root) in tree.roots().iter().enumerate() {
            flatten(&tree, root, vec![index], &mut lookup);
        }
        Self {
            isn: 0,
            quantity: 0,
            tree,
            values,
            lookup,
        }
    }

    /// The shared type tree.
    pub fn tree(&self) -> &Arc<TypeTree> {
        &self.tree
    }

    /// The root values in declaration order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Resolve `name` to its value, first occurrence for repeating
    /// fields. Ghost members are not addressable.
    pub fn search_value(&self, name: &str) -> Option<&Value> {
        self.search_value_with_index(name, 1)
    }

    /// Resolve `name` in the given 1-based occurrence of its repeating
    /// ancestor; `None` when the occurrence does not exist.
    pub fn search_value_with_index(&self, name: &str, occurrence: usize) -> Option<&Value> {
        let occ_index = occurrence.max(1) - 1;
        let path = self.lookup.get(name)?;
        let mut value = self.values.get(*path.first()?)?;
        for &step in &path[1..] {
            let at = if self.tree.node(value.node).kind.is_repeating() {
                occ_index
            } else {
                0
            };
            value = value.occurrence(at)?.get(step)?;
        }
        if self.tree.node(value.node).kind == FieldKind::Multiplefield {
            value = value.occurrence(occ_index)?.first()?;
        }
        Some(value)
    }

    /// Set `name` in the first occurrence.
    pub fn set_value(&mut self, name: &str, input: impl Into<Native>) -> AdaTcpResult<()> {
        self.set_value_with_index(name, 1, input)
    }

    /// Set `name` in the given 1-based occurrence, extending the
    /// occurrence list of the repeating ancestor as needed.
    pub fn set_value_with_index(
        &mut self,
        name: &str,
        occurrence: usize,
        input: impl Into<Native>,
    ) -> AdaTcpResult<()> {
        let path = self
            .lookup
            .get(name)
            .ok_or_else(|| AdaTypeError::FieldNotFound {
                name: name.to_string(),
            })?
            .clone();
        let tree = Arc::clone(&self.tree);
        let mut value = self
            .values
            .get_mut(path[0])
            .ok_or_else(|| AdaTypeError::FieldNotFound {
                name: name.to_string(),
            })?;
        for &step in &path[1..] {
            value = descend(&tree, value, step, occurrence)?;
        }
        if tree.node(value.node).kind.is_repeating() {
            let elements = ensure_occurrence(&tree, value, occurrence)?;
            value = elements
                .first_mut()
                .ok_or_else(|| AdaTypeError::FieldNotFound {
                    name: name.to_string(),
                })?;
        }
        value.set_value(&tree, input)?;
        Ok(())
    }

    /// Encode all root values in order.
    pub fn store(&self, out: &mut BytesMut, endian: Endian) -> AdaTcpResult<()> {
        for value in &self.values {
            value.store_buffer(&self.tree, out, endian)?;
        }
        Ok(())
    }

    /// Decode all root values in order; the inverse of
    /// [`store`](Self::store).
    pub fn parse(&mut self, cursor: &mut BufferCursor<'_>) -> AdaTcpResult<()> {
        for value in &mut self.values {
            value.parse_buffer(&self.tree, cursor)?;
        }
        Ok(())
    }
}

fn flatten(
    tree: &TypeTree,
    node: adalink_types::NodeId,
    path: Vec<usize>,
    lookup: &mut HashMap<String, Vec<usize>>,
) {
    let field = tree.node(node);
    if field.has_flag(FieldFlag::MuGhost) && !field.is_structure() {
        return;
    }
    lookup.insert(field.name.clone(), path.clone());
    for (index, &child) in field.children.iter().enumerate() {
        let mut next = path.clone();
        next.push(index);
        flatten(tree, child, next, lookup);
    }
}

fn descend<'a>(
    tree: &TypeTree,
    value: &'a mut Value,
    step: usize,
    occurrence: usize,
) -> AdaTcpResult<&'a mut Value> {
    let field = tree.node(value.node);
    let occ_index = if field.kind.is_repeating() {
        while value.occurrence_count() < occurrence.max(1) {
            value.add_occurrence(tree)?;
        }
        occurrence.max(1) - 1
    } else {
        0
    };
    let name = field.name.clone();
    match &mut value.data {
        ValueData::Structure(occurrences) => occurrences
            .get_mut(occ_index)
            .and_then(|elements| elements.get_mut(step))
            .ok_or_else(|| AdaTypeError::FieldNotFound { name }.into()),
        _ => Err(AdaTypeError::NotStructure { name }.into()),
    }
}

fn ensure_occurrence<'a>(
    tree: &TypeTree,
    value: &'a mut Value,
    occurrence: usize,
) -> AdaTcpResult<&'a mut Vec<Value>> {
    let occ_index = occurrence.max(1) - 1;
    while value.occurrence_count() <= occ_index {
        value.add_occurrence(tree)?;
    }
    let name = tree.node(value.node).name.clone();
    match &mut value.data {
        ValueData::Structure(occurrences) => Ok(&mut occurrences[occ_index]),
        _ => Err(AdaTypeError::NotStructure { name }.into()),
    }
}

// ── Tests ──────────────────────────────────────────────────────────
