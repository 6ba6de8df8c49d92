use std::env;

/// Startup parameters for the [`crate::coordinator::Coordinator`].
///
/// Feature flags can be flipped after construction via
/// [`Coordinator::configure`](crate::coordinator::Coordinator::configure); worker
/// count and queue capacity are fixed once the worker pool has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub category_metadata_enabled: bool,
    pub activity_enabled: bool,
    pub file_stats_enabled: bool,
}

impl CoreConfig {
    /// Loads configuration the way the rest of this codebase loads process
    /// configuration: required knobs fall back to a documented default rather
    /// than panicking, since the core can run standalone in tests without any
    /// environment set up at all.
    pub fn from_env() -> Self {
        Self {
            worker_count: env_usize("TREECACHE_WORKER_COUNT", 3),
            queue_capacity: env_usize("TREECACHE_QUEUE_CAPACITY", 1024),
            category_metadata_enabled: env_bool("TREECACHE_CATEGORY_METADATA_ENABLED", true),
            activity_enabled: env_bool("TREECACHE_ACTIVITY_ENABLED", true),
            file_stats_enabled: env_bool("TREECACHE_FILE_STATS_ENABLED", true),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            worker_count: 3,
            queue_capacity: 1024,
            category_metadata_enabled: true,
            activity_enabled: true,
            file_stats_enabled: true,
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}
