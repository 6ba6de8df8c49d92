//! Direct and materialized-recursive `{count, size}` tuples per category.
//!
//! Unlike the post count cache, the recursive view here is maintained
//! incrementally: every delta is re-applied at the owning category and at
//! every ancestor through the hierarchy index, because the recursive view is
//! read far more often than it is invalidated and its payload is too large to
//! recompute cheaply on every read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;

use crate::hierarchy::SharedHierarchy;
use crate::model::file_stats::{CategoryFileStats, FileStatsTuple};

#[derive(Default)]
pub struct FileStatsCache {
    entries: RwLock<HashMap<i64, Arc<Mutex<CategoryFileStats>>>>,
    hierarchy: Option<SharedHierarchy>,
}

impl FileStatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hierarchy_view(&mut self, hierarchy: SharedHierarchy) {
        self.hierarchy = Some(hierarchy);
    }

    fn entry(&self, id: i64) -> Arc<Mutex<CategoryFileStats>> {
        if let Some(existing) = self.entries.read().unwrap().get(&id) {
            return existing.clone();
        }
        self.entries
            .write()
            .unwrap()
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(CategoryFileStats::default())))
            .clone()
    }

    /// Applies a delta to `id`'s direct tuple, then re-applies the same delta
    /// to the recursive tuple of `id` and every ancestor (child-to-parent
    /// order, one per-category lock held at a time).
    pub fn apply_delta(&self, id: i64, size_delta: i64, count_delta: i64) {
        self.apply_direct(id, size_delta, count_delta);
        self.apply_recursive_chain(id, size_delta, count_delta);
    }

    fn apply_direct(&self, id: i64, size_delta: i64, count_delta: i64) {
        let entry = self.entry(id);
        let mut guard = entry.lock().unwrap();
        guard.direct.apply_delta(size_delta, count_delta);
        guard.last_update = Utc::now().timestamp_millis();
    }

    /// Applies a delta to `id`'s recursive tuple only, then to every
    /// ancestor's recursive tuple. Used by the coordinator directly when
    /// repairing ancestors after a `CategoryMoved` (where the subtree's own
    /// direct aggregate must not change).
    pub fn apply_recursive_chain(&self, id: i64, size_delta: i64, count_delta: i64) {
        self.apply_recursive_at(id, size_delta, count_delta);
        let ancestors = self
            .hierarchy
            .as_ref()
            .map(|h| h.read().unwrap().ancestors(id))
            .unwrap_or_default();
        for ancestor_id in ancestors {
            self.apply_recursive_at(ancestor_id, size_delta, count_delta);
        }
    }

    /// Applies a delta to exactly `id`'s recursive tuple, without walking the
    /// hierarchy. Used by the coordinator to repair specific ancestor chains
    /// (old and new) after a `CategoryMoved`, where the chain to walk isn't
    /// `id`'s own current ancestors.
    pub fn apply_recursive_at(&self, id: i64, size_delta: i64, count_delta: i64) {
        let entry = self.entry(id);
        let mut guard = entry.lock().unwrap();
        guard.recursive.apply_delta(size_delta, count_delta);
        guard.last_update = Utc::now().timestamp_millis();
    }

    pub fn get_direct(&self, id: i64) -> FileStatsTuple {
        self.entries
            .read()
            .unwrap()
            .get(&id)
            .map(|e| e.lock().unwrap().direct)
            .unwrap_or_default()
    }

    pub fn get_recursive(&self, id: i64) -> FileStatsTuple {
        self.entries
            .read()
            .unwrap()
            .get(&id)
            .map(|e| e.lock().unwrap().recursive)
            .unwrap_or_default()
    }

    pub fn remove(&self, id: i64) {
        self.entries.write().unwrap().remove(&id);
    }

    /// Rebuilds `direct` for `id` from an authoritative attachment size list.
    /// `recursive` is reset to equal `direct`; repairing ancestors is the
    /// coordinator's responsibility (it walks children→parents once after a
    /// bulk seed).
    pub fn refresh(&self, id: i64, attachment_sizes: &[i64]) {
        let tuple = FileStatsTuple {
            count: attachment_sizes.len() as i64,
            size: attachment_sizes.iter().sum(),
        };
        let entry = self.entry(id);
        let mut guard = entry.lock().unwrap();
        guard.direct = tuple;
        guard.recursive = tuple;
        guard.last_update = Utc::now().timestamp_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyIndex;
    use crate::model::Category;
    use std::sync::RwLock as StdRwLock;

    fn cat(id: i64, parent_id: Option<i64>) -> Category {
        Category {
            id,
            name: format!("cat-{id}"),
            parent_id,
            depth: 0,
            created: 0,
            description: String::new(),
        }
    }

    fn hierarchy_with(categories: &[Category]) -> SharedHierarchy {
        let mut idx = HierarchyIndex::new();
        idx.seed(categories);
        Arc::new(StdRwLock::new(idx))
    }

    #[test]
    fn unknown_category_reads_as_zero() {
        let cache = FileStatsCache::new();
        assert_eq!(cache.get_direct(1), FileStatsTuple::default());
        assert_eq!(cache.get_recursive(1), FileStatsTuple::default());
    }

    #[test]
    fn apply_delta_without_hierarchy_only_touches_self() {
        let cache = FileStatsCache::new();
        cache.apply_delta(1, 1024000, 1);
        assert_eq!(
            cache.get_direct(1),
            FileStatsTuple {
                count: 1,
                size: 1024000
            }
        );
        assert_eq!(cache.get_recursive(1), cache.get_direct(1));
    }

    #[test]
    fn apply_delta_propagates_to_ancestors_recursive_only() {
        let mut cache = FileStatsCache::new();
        cache.set_hierarchy_view(hierarchy_with(&[cat(1, None), cat(2, Some(1))]));

        cache.apply_delta(2, 1024000, 1);

        assert_eq!(
            cache.get_direct(2),
            FileStatsTuple {
                count: 1,
                size: 1024000
            }
        );
        assert_eq!(cache.get_recursive(2), cache.get_direct(2));
        assert_eq!(cache.get_direct(1), FileStatsTuple::default());
        assert_eq!(
            cache.get_recursive(1),
            FileStatsTuple {
                count: 1,
                size: 1024000
            }
        );
    }

    #[test]
    fn delete_returns_all_tuples_to_zero() {
        let mut cache = FileStatsCache::new();
        cache.set_hierarchy_view(hierarchy_with(&[cat(1, None), cat(2, Some(1))]));
        cache.apply_delta(2, 1024000, 1);
        cache.apply_delta(2, -1024000, -1);

        assert_eq!(cache.get_direct(2), FileStatsTuple::default());
        assert_eq!(cache.get_recursive(2), FileStatsTuple::default());
        assert_eq!(cache.get_direct(1), FileStatsTuple::default());
        assert_eq!(cache.get_recursive(1), FileStatsTuple::default());
    }

    #[test]
    fn negative_delta_clamps_instead_of_going_negative() {
        let cache = FileStatsCache::new();
        cache.apply_delta(1, -500, -1);
        assert_eq!(cache.get_direct(1), FileStatsTuple::default());
    }

    #[test]
    fn refresh_resets_direct_and_recursive_to_equal_values() {
        let cache = FileStatsCache::new();
        cache.apply_delta(1, 999, 3);
        cache.refresh(1, &[100, 200, 300]);
        assert_eq!(
            cache.get_direct(1),
            FileStatsTuple {
                count: 3,
                size: 600
            }
        );
        assert_eq!(cache.get_recursive(1), cache.get_direct(1));
    }

    #[test]
    fn refresh_is_idempotent() {
        let cache = FileStatsCache::new();
        cache.refresh(1, &[50, 50]);
        let first = cache.get_direct(1);
        cache.refresh(1, &[50, 50]);
        let second = cache.get_direct(1);
        assert_eq!(first, second);
    }

    #[test]
    fn apply_recursive_chain_leaves_direct_of_moved_node_unchanged() {
        let mut cache = FileStatsCache::new();
        cache.set_hierarchy_view(hierarchy_with(&[cat(1, None), cat(2, Some(1))]));
        cache.apply_delta(2, 500, 1);
        let direct_before = cache.get_direct(2);

        // Simulate repairing an ancestor chain after a move: only recursive
        // views change, never the moved node's own direct aggregate.
        cache.apply_recursive_chain(1, 500, 1);

        assert_eq!(cache.get_direct(2), direct_before);
    }
}
