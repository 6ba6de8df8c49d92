use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `category_id = 0` is the sentinel meaning "all categories" (aggregated over
/// roots only, to avoid double-counting — see [`crate::cache::activity`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ActivityPeriodRequest {
    pub category_id: i64,
    pub recursive: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub period: i32,
    pub period_months: u32,
}

impl ActivityPeriodRequest {
    pub fn new(category_id: i64) -> Self {
        Self {
            category_id,
            recursive: false,
            start_date: None,
            end_date: None,
            period: 0,
            period_months: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub total_posts: i64,
    pub active_days: i64,
    pub max_day_activity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityPeriodResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period: i32,
    pub days: Vec<DayActivity>,
    pub stats: PeriodStats,
    pub max_periods: i64,
}
