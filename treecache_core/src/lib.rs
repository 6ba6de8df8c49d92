pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hierarchy;
pub mod model;

pub use cache::activity::ActivityCache;
pub use cache::file_stats::FileStatsCache;
pub use cache::metadata::CategoryMetadataCache;
pub use cache::post_count::PostCountCache;
pub use config::CoreConfig;
pub use coordinator::Coordinator;
pub use error::{CoreError, CoreResult};
pub use hierarchy::HierarchyIndex;
