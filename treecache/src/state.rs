use std::sync::Arc;

use treecache_core::Coordinator;

/// Shared application state handed to every handler through axum's `State`
/// extractor — a single `Arc<Coordinator>`, cheap to clone, the same shape the
/// teacher's own `AppState` wraps its service behind.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}
