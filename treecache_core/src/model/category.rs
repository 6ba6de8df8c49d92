use serde::{Deserialize, Serialize};

use super::update::Update;

/// A node in the category tree, as seen by the cache.
///
/// `depth` and `parent_id` are maintained by whoever owns the tree (the
/// coordinator re-derives `depth` on create/move); the cache never computes
/// depth itself, it only stores what it is told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub depth: i32,
    pub created: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub created: i64,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Update<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A category joined with its post count, direct or recursive depending on
/// how it was requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryWithCount {
    pub category: Category,
    pub post_count: i64,
    pub recursive_post_count: i64,
}
