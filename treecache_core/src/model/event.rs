use super::category::{CategoryCreate, CategoryUpdate};

/// A mutation submitted to the [`crate::coordinator::Coordinator`].
///
/// Each variant only carries the fields its handling actually needs — in
/// particular `PostMoved` carries its destination category as a typed field
/// rather than through an untyped payload the handler would have to downcast.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CategoryCreated {
        category: CategoryCreate,
    },
    CategoryUpdated {
        category_id: i64,
        update: CategoryUpdate,
    },
    CategoryDeleted {
        category_id: i64,
    },
    CategoryMoved {
        category_id: i64,
        old_parent_id: Option<i64>,
        new_parent_id: Option<i64>,
    },
    PostCreated {
        category_id: i64,
        post_id: i64,
        timestamp_ms: i64,
    },
    PostDeleted {
        category_id: i64,
        post_id: i64,
        timestamp_ms: i64,
    },
    PostMoved {
        old_category_id: i64,
        new_category_id: i64,
        post_id: i64,
        timestamp_ms: i64,
    },
    FileAdded {
        category_id: i64,
        file_size: i64,
    },
    FileDeleted {
        category_id: i64,
        file_size: i64,
    },
}

impl Event {
    /// Short name for the event kind, used in log spans and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::CategoryCreated { .. } => "CategoryCreated",
            Event::CategoryUpdated { .. } => "CategoryUpdated",
            Event::CategoryDeleted { .. } => "CategoryDeleted",
            Event::CategoryMoved { .. } => "CategoryMoved",
            Event::PostCreated { .. } => "PostCreated",
            Event::PostDeleted { .. } => "PostDeleted",
            Event::PostMoved { .. } => "PostMoved",
            Event::FileAdded { .. } => "FileAdded",
            Event::FileDeleted { .. } => "FileDeleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_event_shape() {
        let event = Event::PostMoved {
            old_category_id: 1,
            new_category_id: 2,
            post_id: 99,
            timestamp_ms: 0,
        };
        assert_eq!(event.kind(), "PostMoved");
    }
}
