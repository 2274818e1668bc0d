//! Depth-first traversal over a value tree.
//!
//! Callers implement [`Visitor`] and steer the walk through [`Flow`]:
//! `prepare` fires once before the walk and can abort it outright,
//! `enter` fires for every node (scalar or structural) with skip-subtree
//! honored per node, `element` marks each occurrence boundary of a
//! repeating structure, and `leave` closes a structural node after its
//! occurrences. Occurrences are visited in order, so a repeating field
//! yields its members occurrence by occurrence before the walk moves to
//! the next sibling.

use crate::tree::TypeTree;
use crate::value::{Value, ValueData};
use crate::AdaTypeResult;

/// Traversal control returned by visitor callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep walking.
    Continue,
    /// Skip the remainder of the current subtree, continue with siblings.
    SkipTree,
    /// Abort the whole traversal.
    Stop,
}

/// Callbacks invoked while walking a value tree.
///
/// All callbacks default to [`Flow::Continue`]. `element` receives the
/// zero-based occurrence index and the occurrence count, ahead of that
/// occurrence's members.
pub trait Visitor {
    /// Called once before the walk starts; anything but
    /// [`Flow::Continue`] aborts the whole walk.
    fn prepare(&mut self, _tree: &TypeTree, _value: &Value) -> AdaTypeResult<Flow> {
        Ok(Flow::Continue)
    }

    /// Called for every value, scalar or structural.
    fn enter(&mut self, _tree: &TypeTree, _value: &Value) -> AdaTypeResult<Flow> {
        Ok(Flow::Continue)
    }

    /// Called at each occurrence boundary of a repeating structure.
    fn element(
        &mut self,
        _tree: &TypeTree,
        _value: &Value,
        _index: usize,
        _count: usize,
    ) -> AdaTypeResult<Flow> {
        Ok(Flow::Continue)
    }

    /// Called after a structural value's occurrences have been visited.
    fn leave(&mut self, _tree: &TypeTree, _value: &Value) -> AdaTypeResult<()> {
        Ok(())
    }
}

/// Walk `value` depth-first, invoking `visitor`.
///
/// Returns `true` when the walk ran to completion, `false` when
/// `prepare` declined it or a callback returned [`Flow::Stop`].
pub fn traverse<V: Visitor>(
    tree: &TypeTree,
    value: &Value,
    visitor: &mut V,
) -> AdaTypeResult<bool> {
    if visitor.prepare(tree, value)? != Flow::Continue {
        return Ok(false);
    }
    Ok(visit(tree, value, visitor)? != Flow::Stop)
}

fn visit<V: Visitor>(tree: &TypeTree, value: &Value, visitor: &mut V) -> AdaTypeResult<Flow> {
    let descend = match visitor.enter(tree, value)? {
        Flow::Continue => true,
        Flow::SkipTree => false,
        Flow::Stop => return Ok(Flow::Stop),
    };
    if let ValueData::Structure(occurrences) = &value.data {
        if descend {
            let repeating = tree.node(value.node).kind.is_repeating();
            let count = occurrences.len();
            'walk: for (index, occurrence) in occurrences.iter().enumerate() {
                if repeating {
                    match visitor.element(tree, value, index, count)? {
                        Flow::Continue => {}
                        Flow::SkipTree => break 'walk,
                        Flow::Stop => return Ok(Flow::Stop),
                    }
                }
                for member in occurrence {
                    match visit(tree, member, visitor)? {
                        Flow::Continue => {}
                        Flow::SkipTree => break 'walk,
                        Flow::Stop => return Ok(Flow::Stop),
                    }
                }
            }
        }
        visitor.leave(tree, value)?;
    }
    Ok(Flow::Continue)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldFlag, FieldKind};
    use crate::tree::TypeTree;

    #[derive(Default)]
    struct Collector {
        seen: Vec<String>,
        scalar_enters: usize,
        decline: bool,
        stop_at: Option<usize>,
        skip: Option<String>,
    }

    impl Visitor for Collector {
        fn prepare(&mut self, _tree: &TypeTree, _value: &Value) -> AdaTypeResult<Flow> {
            if self.decline {
                return Ok(Flow::SkipTree);
            }
            Ok(Flow::Continue)
        }

        fn enter(&mut self, tree: &TypeTree, value: &Value) -> AdaTypeResult<Flow> {
            let field = tree.node(value.node);
            if self.skip.as_deref() == Some(field.name.as_str()) {
                return Ok(Flow::SkipTree);
            }
            if !field.is_structure() {
                self.scalar_enters += 1;
                // Ghost members are reported by their occurrence boundary.
                if !field.has_flag(FieldFlag::MuGhost) {
                    self.seen.push(field.name.clone());
                    if self.stop_at == Some(self.seen.len()) {
                        return Ok(Flow::Stop);
                    }
                }
            }
            Ok(Flow::Continue)
        }

        fn element(
            &mut self,
            _tree: &TypeTree,
            _value: &Value,
            index: usize,
            _count: usize,
        ) -> AdaTypeResult<Flow> {
            self.seen.push(format!("B{}", index + 1));
            if self.stop_at == Some(self.seen.len()) {
                return Ok(Flow::Stop);
            }
            Ok(Flow::Continue)
        }
    }

    fn sample() -> (TypeTree, Value) {
        let mut tree = TypeTree::new();
        let root = tree.new_structure(FieldKind::Group, "ROOT", 0).unwrap();
        let a = tree.new_scalar(FieldKind::UInt4, "A", 4).unwrap();
        let mu = tree
            .new_structure(FieldKind::Multiplefield, "MB", 0)
            .unwrap();
        let b = tree.new_scalar(FieldKind::UInt2, "B", 2).unwrap();
        let c = tree.new_scalar(FieldKind::String, "C", 4).unwrap();
        tree.add_field(root, a).unwrap();
        tree.add_field(root, mu).unwrap();
        tree.add_field(mu, b).unwrap();
        tree.add_field(root, c).unwrap();

        let mut value = Value::from_type(&tree, root);
        match &mut value.data {
            ValueData::Structure(occ) => {
                for n in 1..=3u32 {
                    let inner = occ[0][1].add_occurrence(&tree).unwrap();
                    inner[0].set_value(&tree, n).unwrap();
                }
            }
            _ => unreachable!(),
        }
        (tree, value)
    }

    #[test]
    fn occurrence_boundaries_in_order() {
        let (tree, value) = sample();
        let mut collector = Collector::default();
        assert!(traverse(&tree, &value, &mut collector).unwrap());
        assert_eq!(collector.seen, vec!["A", "B1", "B2", "B3", "C"]);
    }

    #[test]
    fn enter_fires_for_scalars() {
        let mut tree = TypeTree::new();
        let grp = tree.new_structure(FieldKind::Group, "GA", 0).unwrap();
        let fld = tree.new_scalar(FieldKind::UInt4, "AA", 4).unwrap();
        tree.add_field(grp, fld).unwrap();
        let value = Value::from_type(&tree, grp);

        let mut collector = Collector::default();
        assert!(traverse(&tree, &value, &mut collector).unwrap());
        assert_eq!(collector.scalar_enters, 1);
        assert_eq!(collector.seen, vec!["AA"]);
    }

    #[test]
    fn prepare_decline_aborts_whole_walk() {
        let (tree, value) = sample();
        let mut collector = Collector {
            decline: true,
            ..Collector::default()
        };
        assert!(!traverse(&tree, &value, &mut collector).unwrap());
        assert!(collector.seen.is_empty());
        assert_eq!(collector.scalar_enters, 0);
    }

    #[test]
    fn stop_aborts_walk() {
        let (tree, value) = sample();
        let mut collector = Collector {
            stop_at: Some(2),
            ..Collector::default()
        };
        assert!(!traverse(&tree, &value, &mut collector).unwrap());
        assert_eq!(collector.seen, vec!["A", "B1"]);
    }

    #[test]
    fn skip_tree_skips_subtree_only() {
        let (tree, value) = sample();
        let mut collector = Collector {
            skip: Some("MB".to_string()),
            ..Collector::default()
        };
        assert!(traverse(&tree, &value, &mut collector).unwrap());
        assert_eq!(collector.seen, vec!["A", "C"]);
    }
}
