use serde::{Deserialize, Serialize};

/// A `{count, size}` pair, clamped to non-negative at every write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatsTuple {
    pub count: i64,
    pub size: i64,
}

impl FileStatsTuple {
    pub fn apply_delta(&mut self, size_delta: i64, count_delta: i64) {
        self.count = (self.count + count_delta).max(0);
        self.size = (self.size + size_delta).max(0);
    }

    pub fn negate(self) -> FileStatsTuple {
        FileStatsTuple {
            count: -self.count,
            size: -self.size,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryFileStats {
    pub direct: FileStatsTuple,
    pub recursive: FileStatsTuple,
    pub last_update: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FileStatsRequest {
    pub category_id: i64,
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStatsResponse {
    pub count: i64,
    pub size: i64,
}
