//! Direct post counts per category. Recursive counts are recomputed on every
//! read rather than materialized — see the module-level rationale in
//! `SPEC_FULL.md` §4.2: a per-category payload of one integer makes
//! recomputation cheaper than incremental maintenance would be.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::hierarchy::SharedHierarchy;

#[derive(Default)]
pub struct PostCountCache {
    counts: RwLock<HashMap<i64, i64>>,
    hierarchy: Option<SharedHierarchy>,
}

impl PostCountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the cache to the hierarchy index used by `get_recursive`.
    pub fn set_hierarchy_view(&mut self, hierarchy: SharedHierarchy) {
        self.hierarchy = Some(hierarchy);
    }

    pub fn set(&self, id: i64, n: i64) {
        self.counts.write().unwrap().insert(id, n.max(0));
    }

    pub fn delta(&self, id: i64, d: i64) {
        let mut counts = self.counts.write().unwrap();
        let entry = counts.entry(id).or_insert(0);
        *entry = (*entry + d).max(0);
    }

    pub fn get(&self, id: i64) -> i64 {
        self.counts.read().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub fn get_recursive(&self, id: i64) -> i64 {
        let descendants = self
            .hierarchy
            .as_ref()
            .map(|h| h.read().unwrap().descendants(id))
            .unwrap_or_default();
        let counts = self.counts.read().unwrap();
        let direct = counts.get(&id).copied().unwrap_or(0);
        direct
            + descendants
                .iter()
                .map(|d| counts.get(d).copied().unwrap_or(0))
                .sum::<i64>()
    }

    pub fn total(&self) -> i64 {
        self.counts.read().unwrap().values().sum()
    }

    pub fn remove(&self, id: i64) {
        self.counts.write().unwrap().remove(&id);
    }

    /// Bulk replace, used when seeding from the authoritative store.
    pub fn refresh_cache(&self, counts_by_category: HashMap<i64, i64>) {
        *self.counts.write().unwrap() = counts_by_category;
    }
}
