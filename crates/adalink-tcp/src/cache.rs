//! Layout cache for parsed field type trees.
//!
//! Field layouts are expensive to fetch and stable for the lifetime of a
//! file, so sessions share parsed trees through an explicit cache object.
//! Read-mostly: lookups take a shared lock, inserts an exclusive one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use adalink_types::TypeTree;

type Key = (u32, u32, String);

/// Cache of type trees keyed by database id, file number, and layout
/// name.
#[derive(Debug, Default)]
pub struct LayoutCache {
    inner: RwLock<HashMap<Key, Arc<TypeTree>>>,
}

impl LayoutCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached layout.
    pub fn lookup(&self, database: u32, file: u32, layout: &str) -> Option<Arc<TypeTree>> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .get(&(database, file, layout.to_string()))
            .map(Arc::clone)
    }

    /// Insert or replace a layout, returning the shared handle.
    pub fn store(
        &self,
        database: u32,
        file: u32,
        layout: &str,
        tree: TypeTree,
    ) -> Arc<TypeTree> {
        let shared = Arc::new(tree);
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert((database, file, layout.to_string()), Arc::clone(&shared));
        shared
    }

    /// Drop a cached layout.
    pub fn remove(&self, database: u32, file: u32, layout: &str) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.remove(&(database, file, layout.to_string()));
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use adalink_types::FieldKind;

    fn layout() -> TypeTree {
        let mut tree = TypeTree::new();
        tree.new_scalar(FieldKind::UInt4, "AA", 4).unwrap();
        tree
    }

    #[test]
    fn miss_then_hit() {
        let cache = LayoutCache::new();
        assert!(cache.lookup(77, 11, "employees").is_none());

        let stored = cache.store(77, 11, "employees", layout());
        let hit = cache.lookup(77, 11, "employees").unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_distinct_per_database_and_file() {
        let cache = LayoutCache::new();
        cache.store(77, 11, "employees", layout());
        assert!(cache.lookup(78, 11, "employees").is_none());
        assert!(cache.lookup(77, 12, "employees").is_none());
        assert!(cache.lookup(77, 11, "vehicles").is_none());
    }

    #[test]
    fn remove_evicts() {
        let cache = LayoutCache::new();
        cache.store(77, 11, "employees", layout());
        cache.remove(77, 11, "employees");
        assert!(cache.lookup(77, 11, "employees").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(LayoutCache::new());
        cache.store(77, 11, "employees", layout());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.lookup(77, 11, "employees").is_some())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
