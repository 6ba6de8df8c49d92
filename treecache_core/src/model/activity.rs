use chrono::NaiveDate;

/// A single sparse histogram bucket. Only used at the interfaces — the cache's
/// internal storage is a `BTreeMap<NaiveDate, i64>` so that period queries can
/// iterate a range directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityStats {
    pub total_posts: i64,
    pub total_active_days: i64,
    pub first_post_time: Option<i64>,
    pub last_post_time: Option<i64>,
    pub recursive_posts: i64,
    pub recursive_active_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryActivity {
    pub category_id: i64,
    pub direct: std::collections::BTreeMap<NaiveDate, i64>,
    pub recursive: std::collections::BTreeMap<NaiveDate, i64>,
    pub stats: ActivityStats,
    pub last_update: i64,
}
