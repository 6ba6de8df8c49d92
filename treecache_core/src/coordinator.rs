//! Single entry point for every mutation. Fans a typed [`Event`] out to the
//! four aggregate caches, serializing structural edits behind the hierarchy
//! write lock and draining everything else through a fixed worker pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::cache::activity::ActivityCache;
use crate::cache::file_stats::FileStatsCache;
use crate::cache::metadata::CategoryMetadataCache;
use crate::cache::post_count::PostCountCache;
use crate::config::CoreConfig;
use crate::hierarchy::{HierarchyIndex, SharedHierarchy};
use crate::model::category::Category;
use crate::model::event::Event;
use crate::model::update::Update;

struct State {
    hierarchy: SharedHierarchy,
    post_counts: PostCountCache,
    file_stats: FileStatsCache,
    activity: ActivityCache,
    metadata: CategoryMetadataCache,
    category_metadata_enabled: AtomicBool,
    activity_enabled: AtomicBool,
    file_stats_enabled: AtomicBool,
}

impl State {
    fn new(config: CoreConfig) -> Self {
        let hierarchy: SharedHierarchy = Arc::new(std::sync::RwLock::new(HierarchyIndex::new()));

        let mut post_counts = PostCountCache::new();
        post_counts.set_hierarchy_view(hierarchy.clone());
        let mut file_stats = FileStatsCache::new();
        file_stats.set_hierarchy_view(hierarchy.clone());
        let mut activity = ActivityCache::new();
        activity.set_hierarchy_view(hierarchy.clone());

        Self {
            hierarchy,
            post_counts,
            file_stats,
            activity,
            metadata: CategoryMetadataCache::new(),
            category_metadata_enabled: AtomicBool::new(config.category_metadata_enabled),
            activity_enabled: AtomicBool::new(config.activity_enabled),
            file_stats_enabled: AtomicBool::new(config.file_stats_enabled),
        }
    }

    fn handle_event(&self, event: &Event) {
        match event {
            Event::CategoryCreated { category } => self.on_category_created(category),
            Event::CategoryUpdated { category_id, update } => {
                self.on_category_updated(*category_id, update)
            }
            Event::CategoryDeleted { category_id } => self.on_category_deleted(*category_id),
            Event::CategoryMoved {
                category_id,
                old_parent_id,
                new_parent_id,
            } => self.on_category_moved(*category_id, *old_parent_id, *new_parent_id),
            Event::PostCreated {
                category_id,
                timestamp_ms,
                ..
            } => self.on_post_delta(*category_id, *timestamp_ms, 1),
            Event::PostDeleted {
                category_id,
                timestamp_ms,
                ..
            } => self.on_post_delta(*category_id, *timestamp_ms, -1),
            Event::PostMoved {
                old_category_id,
                new_category_id,
                timestamp_ms,
                ..
            } => {
                self.on_post_delta(*old_category_id, *timestamp_ms, -1);
                self.on_post_delta(*new_category_id, *timestamp_ms, 1);
            }
            Event::FileAdded {
                category_id,
                file_size,
            } => self.on_file_delta(*category_id, *file_size, 1),
            Event::FileDeleted {
                category_id,
                file_size,
            } => self.on_file_delta(*category_id, -*file_size, -1),
        }
    }

    fn on_category_created(&self, create: &crate::model::category::CategoryCreate) {
        let mut hierarchy = self.hierarchy.write().unwrap();
        if let Err(err) = hierarchy.add_edge(create.id, create.parent_id) {
            tracing::warn!(category_id = create.id, %err, "failed to add hierarchy edge for new category");
            return;
        }
        self.post_counts.set(create.id, 0);
        if self.category_metadata_enabled.load(Ordering::Relaxed) {
            self.metadata.add(create.clone());
        }
    }

    fn on_category_updated(&self, category_id: i64, update: &crate::model::category::CategoryUpdate) {
        let parent_changes = update.parent_id.should_update();
        if parent_changes {
            let old_parent_id = self.hierarchy.read().unwrap().parent_of(category_id);
            let new_parent_id = match &update.parent_id {
                Update::Set(parent_id) => Some(*parent_id),
                Update::Clear => None,
                Update::Unchanged => unreachable!("guarded by should_update above"),
            };
            self.on_category_moved(category_id, old_parent_id, new_parent_id);
        }

        if self.category_metadata_enabled.load(Ordering::Relaxed) {
            let new_depth = if parent_changes {
                let parent_id = self.hierarchy.read().unwrap().parent_of(category_id);
                Some(
                    parent_id
                        .and_then(|p| self.metadata.get(p))
                        .map(|p| p.depth + 1)
                        .unwrap_or(0),
                )
            } else {
                None
            };
            if let Err(err) = self.metadata.update(category_id, update, new_depth) {
                tracing::warn!(category_id, %err, "category metadata update failed");
            }
        }
    }

    fn on_category_deleted(&self, category_id: i64) {
        {
            let mut hierarchy = self.hierarchy.write().unwrap();
            hierarchy.remove_edge(category_id);
        }
        self.post_counts.remove(category_id);
        self.file_stats.remove(category_id);
        self.activity.remove(category_id);
        if self.category_metadata_enabled.load(Ordering::Relaxed) {
            self.metadata.remove(category_id);
        }
    }

    fn on_category_moved(&self, category_id: i64, old_parent_id: Option<i64>, new_parent_id: Option<i64>) {
        if old_parent_id == new_parent_id {
            return;
        }

        let snapshot_file_stats = self.file_stats.get_recursive(category_id);
        let snapshot_activity = self.activity.get(category_id).recursive;

        let (old_chain, new_chain) = {
            let mut hierarchy = self.hierarchy.write().unwrap();
            let old_chain = hierarchy.ancestors(category_id);
            hierarchy.remove_edge(category_id);
            if let Err(err) = hierarchy.add_edge(category_id, new_parent_id) {
                tracing::warn!(category_id, %err, "failed to move category; left detached from old parent");
                return;
            }
            let new_chain = hierarchy.ancestors(category_id);
            (old_chain, new_chain)
        };

        if self.file_stats_enabled.load(Ordering::Relaxed) {
            for ancestor_id in &old_chain {
                self.file_stats.apply_recursive_at(
                    *ancestor_id,
                    -snapshot_file_stats.size,
                    -snapshot_file_stats.count,
                );
            }
            for ancestor_id in &new_chain {
                self.file_stats.apply_recursive_at(
                    *ancestor_id,
                    snapshot_file_stats.size,
                    snapshot_file_stats.count,
                );
            }
        }

        if self.activity_enabled.load(Ordering::Relaxed) {
            for (date, count) in &snapshot_activity {
                for ancestor_id in &old_chain {
                    self.activity.apply_recursive_day(*ancestor_id, *date, -count);
                }
                for ancestor_id in &new_chain {
                    self.activity.apply_recursive_day(*ancestor_id, *date, *count);
                }
            }
        }
    }

    fn on_post_delta(&self, category_id: i64, timestamp_ms: i64, delta: i64) {
        self.post_counts.delta(category_id, delta);
        if self.activity_enabled.load(Ordering::Relaxed) {
            self.activity.apply_post_activity(category_id, timestamp_ms, delta);
        }
    }

    fn on_file_delta(&self, category_id: i64, size_delta: i64, count_delta: i64) {
        if self.file_stats_enabled.load(Ordering::Relaxed) {
            self.file_stats.apply_delta(category_id, size_delta, count_delta);
        }
    }
}

/// The coordinator handle. Cheap to clone-by-reference (every method takes
/// `&self`); the same instance is meant to be shared across every writer and
/// reader thread in the process.
pub struct Coordinator {
    state: Arc<State>,
    tx: StdMutex<Option<mpsc::Sender<Event>>>,
    rx: Arc<AsyncMutex<mpsc::Receiver<Event>>>,
    workers: StdMutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl Coordinator {
    pub fn new(config: CoreConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            state: Arc::new(State::new(config)),
            tx: StdMutex::new(Some(tx)),
            rx: Arc::new(AsyncMutex::new(rx)),
            workers: StdMutex::new(Vec::new()),
            worker_count: config.worker_count.max(1),
        }
    }

    /// Spawns the fixed worker pool. Idempotent calls add more workers on top
    /// of any already running, so callers should only call this once.
    pub fn start(&self) {
        let mut workers = self.workers.lock().unwrap();
        for _ in 0..self.worker_count {
            let state = self.state.clone();
            let rx = self.rx.clone();
            workers.push(tokio::spawn(Self::worker_loop(state, rx)));
        }
    }

    async fn worker_loop(state: Arc<State>, rx: Arc<AsyncMutex<mpsc::Receiver<Event>>>) {
        loop {
            let event = {
                let mut guard = rx.lock().await;
                guard.recv().await
            };
            match event {
                Some(event) => state.handle_event(&event),
                None => break,
            }
        }
    }

    /// Closes the queue and waits for in-flight events to drain. `Submit`
    /// after `stop` falls back to inline processing rather than panicking,
    /// but callers should not rely on that — the contract is undefined.
    pub async fn stop(&self) {
        self.tx.lock().unwrap().take();
        let handles: Vec<_> = self.workers.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Enqueues `event`. Falls back to processing inline on the caller's
    /// thread when the queue is full (backpressure) or closed (after
    /// `stop`), so no event is ever silently dropped.
    pub fn submit(&self, event: Event) {
        let tx = self.tx.lock().unwrap().clone();
        let Some(tx) = tx else {
            tracing::warn!(kind = event.kind(), "submit called after stop; applying inline");
            self.state.handle_event(&event);
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(kind = event.kind(), "queue full; applying inline as backpressure");
                self.state.handle_event(&event);
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                tracing::warn!(kind = event.kind(), "queue closed; applying inline");
                self.state.handle_event(&event);
            }
        }
    }

    /// Reconfigures the three optional-cache feature flags. Takes effect
    /// immediately; a flag flipped from off to on leaves prior aggregates
    /// stale until the writer calls the matching `Refresh` pathway.
    pub fn configure(&self, category_metadata_enabled: bool, activity_enabled: bool, file_stats_enabled: bool) {
        self.state
            .category_metadata_enabled
            .store(category_metadata_enabled, Ordering::Relaxed);
        self.state.activity_enabled.store(activity_enabled, Ordering::Relaxed);
        self.state
            .file_stats_enabled
            .store(file_stats_enabled, Ordering::Relaxed);
    }

    pub fn post_counts(&self) -> &PostCountCache {
        &self.state.post_counts
    }

    pub fn file_stats(&self) -> &FileStatsCache {
        &self.state.file_stats
    }

    pub fn activity(&self) -> &ActivityCache {
        &self.state.activity
    }

    pub fn metadata(&self) -> &CategoryMetadataCache {
        &self.state.metadata
    }

    pub fn hierarchy(&self) -> &SharedHierarchy {
        &self.state.hierarchy
    }

    /// Startup seeding, in the order the database-of-record collaborator is
    /// expected to call it: hierarchy, then post counts. File stats and
    /// activity are seeded per category by the caller via
    /// [`Coordinator::file_stats`]`.refresh`/[`Coordinator::activity`]`.refresh`,
    /// followed by a single [`Coordinator::repair_recursive_aggregates`] call.
    pub fn seed(&self, categories: Vec<Category>, post_counts_by_category: HashMap<i64, i64>) {
        self.state.hierarchy.write().unwrap().seed(&categories);
        self.state.post_counts.refresh_cache(post_counts_by_category);
        if self.state.category_metadata_enabled.load(Ordering::Relaxed) {
            self.state.metadata.refresh(categories);
        }
    }

    /// Rolls materialized recursive aggregates (file stats, activity) up the
    /// tree once, children before parents. Call exactly once after a bulk
    /// `seed` plus a per-category `Refresh` on each optional cache.
    pub fn repair_recursive_aggregates(&self) {
        let file_stats_enabled = self.state.file_stats_enabled.load(Ordering::Relaxed);
        let activity_enabled = self.state.activity_enabled.load(Ordering::Relaxed);
        if !file_stats_enabled && !activity_enabled {
            return;
        }

        let order = self.state.hierarchy.read().unwrap().bottom_up_order();
        for id in order {
            let Some(parent_id) = self.state.hierarchy.read().unwrap().parent_of(id) else {
                continue;
            };
            if file_stats_enabled {
                let recursive = self.state.file_stats.get_recursive(id);
                self.state
                    .file_stats
                    .apply_recursive_at(parent_id, recursive.size, recursive.count);
            }
            if activity_enabled {
                let recursive = self.state.activity.get(id).recursive;
                for (date, count) in recursive {
                    self.state.activity.apply_recursive_day(parent_id, date, count);
                }
            }
        }
    }
}
