//! Category record lookup: the only cache that stores the category's own
//! fields rather than an aggregate derived from it.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::cache::post_count::PostCountCache;
use crate::error::{CoreError, CoreResult};
use crate::model::category::{Category, CategoryCreate, CategoryUpdate, CategoryWithCount};
use crate::model::update::Update;

#[derive(Default)]
pub struct CategoryMetadataCache {
    categories: RwLock<HashMap<i64, Category>>,
}

impl CategoryMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic replace from an authoritative list, used at startup.
    pub fn refresh(&self, categories: Vec<Category>) {
        let mut map = HashMap::with_capacity(categories.len());
        for category in categories {
            map.insert(category.id, category);
        }
        *self.categories.write().unwrap() = map;
    }

    pub fn add(&self, create: CategoryCreate) -> Category {
        let category = Category {
            id: create.id,
            name: create.name,
            parent_id: create.parent_id,
            depth: 0,
            created: create.created,
            description: create.description,
        };
        self.categories
            .write()
            .unwrap()
            .insert(category.id, category.clone());
        category
    }

    /// Applies a partial update in place. `new_depth` must be supplied by the
    /// caller whenever `patch.parent_id` changes — this cache never derives
    /// depth itself, it only stores what it's told (see
    /// [`crate::coordinator::Coordinator`]).
    pub fn update(&self, id: i64, patch: &CategoryUpdate, new_depth: Option<i32>) -> CoreResult<Category> {
        let mut categories = self.categories.write().unwrap();
        let category = categories
            .get_mut(&id)
            .ok_or_else(|| CoreError::InvalidArgument(format!("unknown category {id}")))?;

        if let Some(name) = &patch.name {
            category.name = name.clone();
        }
        if let Some(description) = &patch.description {
            category.description = description.clone();
        }
        match &patch.parent_id {
            Update::Unchanged => {}
            Update::Clear => {
                category.parent_id = None;
                if let Some(depth) = new_depth {
                    category.depth = depth;
                }
            }
            Update::Set(parent_id) => {
                category.parent_id = Some(*parent_id);
                if let Some(depth) = new_depth {
                    category.depth = depth;
                }
            }
        }
        Ok(category.clone())
    }

    pub fn remove(&self, id: i64) -> Option<Category> {
        self.categories.write().unwrap().remove(&id)
    }

    pub fn get(&self, id: i64) -> Option<Category> {
        self.categories.read().unwrap().get(&id).cloned()
    }

    pub fn list(&self) -> Vec<Category> {
        self.categories.read().unwrap().values().cloned().collect()
    }

    pub fn list_by_parent(&self, parent_id: Option<i64>) -> Vec<Category> {
        self.categories
            .read()
            .unwrap()
            .values()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect()
    }

    pub fn get_with_count(&self, id: i64, post_counts: &PostCountCache) -> Option<CategoryWithCount> {
        let category = self.get(id)?;
        Some(CategoryWithCount {
            category,
            post_count: post_counts.get(id),
            recursive_post_count: post_counts.get_recursive(id),
        })
    }
}
