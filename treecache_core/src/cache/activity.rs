//! Per-category daily post histograms, direct and materialized-recursive,
//! plus the period-window query used by activity dashboards.
//!
//! Like the file stats cache, the recursive histogram is maintained
//! incrementally (re-applied at every ancestor on every post event) rather
//! than recomputed on read, because its payload — a sparse per-day map — is
//! too large to recompute cheaply at query time.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::{CoreError, CoreResult};
use crate::hierarchy::SharedHierarchy;
use crate::model::activity::{ActivityStats, CategoryActivity};
use crate::model::period::{ActivityPeriodRequest, ActivityPeriodResponse, DayActivity, PeriodStats};

#[derive(Default)]
pub struct ActivityCache {
    entries: RwLock<HashMap<i64, Arc<Mutex<CategoryActivity>>>>,
    hierarchy: Option<SharedHierarchy>,
}

impl ActivityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hierarchy_view(&mut self, hierarchy: SharedHierarchy) {
        self.hierarchy = Some(hierarchy);
    }

    fn entry(&self, id: i64) -> Arc<Mutex<CategoryActivity>> {
        if let Some(existing) = self.entries.read().unwrap().get(&id) {
            return existing.clone();
        }
        self.entries
            .write()
            .unwrap()
            .entry(id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(CategoryActivity {
                    category_id: id,
                    ..Default::default()
                }))
            })
            .clone()
    }

    /// Applies `delta` (`+1` or `-1`) to the owning category's direct
    /// histogram and to the recursive histogram of the category and every
    /// ancestor.
    pub fn apply_post_activity(&self, id: i64, timestamp_ms: i64, delta: i64) {
        let date = timestamp_to_date(timestamp_ms);
        self.apply_direct_day(id, date, delta, timestamp_ms);
        self.apply_recursive_day(id, date, delta);
        let ancestors = self
            .hierarchy
            .as_ref()
            .map(|h| h.read().unwrap().ancestors(id))
            .unwrap_or_default();
        for ancestor_id in ancestors {
            self.apply_recursive_day(ancestor_id, date, delta);
        }
    }

    fn apply_direct_day(&self, id: i64, date: NaiveDate, delta: i64, timestamp_ms: i64) {
        let entry = self.entry(id);
        let mut guard = entry.lock().unwrap();
        bump_bucket(&mut guard.direct, date, delta, id, "direct");
        guard.stats.total_posts = (guard.stats.total_posts + delta).max(0);
        guard.stats.total_active_days = guard.direct.len() as i64;
        if delta > 0 {
            guard.stats.first_post_time = Some(
                guard
                    .stats
                    .first_post_time
                    .map_or(timestamp_ms, |t| t.min(timestamp_ms)),
            );
            guard.stats.last_post_time = Some(
                guard
                    .stats
                    .last_post_time
                    .map_or(timestamp_ms, |t| t.max(timestamp_ms)),
            );
        }
        guard.last_update = Utc::now().timestamp_millis();
    }

    /// Applies a delta to `id`'s recursive histogram only, for one day. Used
    /// directly by the coordinator when repairing ancestor chains after a
    /// `CategoryMoved`.
    pub fn apply_recursive_day(&self, id: i64, date: NaiveDate, delta: i64) {
        let entry = self.entry(id);
        let mut guard = entry.lock().unwrap();
        bump_bucket(&mut guard.recursive, date, delta, id, "recursive");
        guard.stats.recursive_posts = (guard.stats.recursive_posts + delta).max(0);
        guard.stats.recursive_active_days = guard.recursive.len() as i64;
        guard.last_update = Utc::now().timestamp_millis();
    }

    pub fn get(&self, id: i64) -> CategoryActivity {
        self.entries
            .read()
            .unwrap()
            .get(&id)
            .map(|e| e.lock().unwrap().clone())
            .unwrap_or_else(|| CategoryActivity {
                category_id: id,
                ..Default::default()
            })
    }

    pub fn remove(&self, id: i64) {
        self.entries.write().unwrap().remove(&id);
    }

    /// Rebuilds the direct histogram for `id` from an authoritative post
    /// timestamp list and copies it onto `recursive` for this node alone.
    /// Repairing ancestors is the coordinator's job, run once after a bulk
    /// seed.
    pub fn refresh(&self, id: i64, post_timestamps_ms: &[i64]) {
        let mut direct = BTreeMap::new();
        let mut first = None;
        let mut last = None;
        for &ts in post_timestamps_ms {
            let date = timestamp_to_date(ts);
            *direct.entry(date).or_insert(0) += 1;
            first = Some(first.map_or(ts, |f: i64| f.min(ts)));
            last = Some(last.map_or(ts, |l: i64| l.max(ts)));
        }
        let stats = ActivityStats {
            total_posts: post_timestamps_ms.len() as i64,
            total_active_days: direct.len() as i64,
            first_post_time: first,
            last_post_time: last,
            recursive_posts: post_timestamps_ms.len() as i64,
            recursive_active_days: direct.len() as i64,
        };
        let entry = self.entry(id);
        let mut guard = entry.lock().unwrap();
        guard.category_id = id;
        guard.recursive = direct.clone();
        guard.direct = direct;
        guard.stats = stats;
        guard.last_update = Utc::now().timestamp_millis();
    }

    pub fn query_period(&self, req: &ActivityPeriodRequest) -> CoreResult<ActivityPeriodResponse> {
        if req.period_months == 0 {
            return Err(CoreError::InvalidArgument(
                "period_months must be positive".into(),
            ));
        }
        let today = Utc::now().date_naive();
        let (start, end) = match (req.start_date, req.end_date) {
            (Some(s), Some(e)) => {
                if s > e {
                    return Err(CoreError::InvalidArgument(
                        "start_date must not be after end_date".into(),
                    ));
                }
                (s, e)
            }
            _ => self.compute_window(today, req.period, req.period_months),
        };

        let days = self.collect_days(req.category_id, req.recursive, start, end);
        let total_posts: i64 = days.iter().map(|d| d.count).sum();
        let active_days = days.len() as i64;
        let max_day_activity = days.iter().map(|d| d.count).max().unwrap_or(0);
        let max_periods = self.max_periods(req.category_id, today, req.period_months);

        Ok(ActivityPeriodResponse {
            start_date: start,
            end_date: end,
            period: req.period,
            days,
            stats: PeriodStats {
                total_posts,
                active_days,
                max_day_activity,
            },
            max_periods,
        })
    }

    fn compute_window(&self, today: NaiveDate, period: i32, period_months: u32) -> (NaiveDate, NaiveDate) {
        let current_start = first_of_month_offset(today, -(period_months as i32 - 1));
        if period == 0 {
            return (current_start, today);
        }
        let start = first_of_month_offset(current_start, period * period_months as i32);
        let next_start = first_of_month_offset(start, period_months as i32);
        let end = next_start.pred_opt().unwrap_or(next_start);
        (start, end)
    }

    fn collect_days(
        &self,
        category_id: i64,
        recursive: bool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<DayActivity> {
        let maps = if category_id == 0 {
            self.root_maps(recursive)
        } else {
            vec![self.histogram_for(category_id, recursive)]
        };

        let mut merged: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for map in maps {
            for (date, count) in map.range(start..=end) {
                *merged.entry(*date).or_insert(0) += *count;
            }
        }
        merged
            .into_iter()
            .map(|(date, count)| DayActivity { date, count })
            .collect()
    }

    fn histogram_for(&self, id: i64, recursive: bool) -> BTreeMap<NaiveDate, i64> {
        self.entries
            .read()
            .unwrap()
            .get(&id)
            .map(|e| {
                let guard = e.lock().unwrap();
                if recursive {
                    guard.recursive.clone()
                } else {
                    guard.direct.clone()
                }
            })
            .unwrap_or_default()
    }

    fn root_ids(&self) -> Vec<i64> {
        self.hierarchy
            .as_ref()
            .map(|h| h.read().unwrap().tracked_roots())
            .unwrap_or_else(|| self.entries.read().unwrap().keys().copied().collect())
    }

    fn root_maps(&self, recursive: bool) -> Vec<BTreeMap<NaiveDate, i64>> {
        self.root_ids()
            .into_iter()
            .map(|id| self.histogram_for(id, recursive))
            .collect()
    }

    fn max_periods(&self, category_id: i64, today: NaiveDate, period_months: u32) -> i64 {
        let earliest = if category_id == 0 {
            self.root_ids()
                .into_iter()
                .filter_map(|id| self.first_post_time(id))
                .min()
        } else {
            self.first_post_time(category_id)
        };
        let Some(first_ms) = earliest else {
            return 0;
        };
        let first_date = timestamp_to_date(first_ms);
        (months_between(first_date, today) / period_months as i64).max(0)
    }

    fn first_post_time(&self, id: i64) -> Option<i64> {
        self.entries
            .read()
            .unwrap()
            .get(&id)
            .and_then(|e| e.lock().unwrap().stats.first_post_time)
    }
}

fn bump_bucket(map: &mut BTreeMap<NaiveDate, i64>, date: NaiveDate, delta: i64, id: i64, view: &str) {
    let slot = map.entry(date).or_insert(0);
    *slot += delta;
    let value = *slot;
    if value <= 0 {
        if value < 0 {
            tracing::warn!(category_id = id, view, date = %date, value, "activity bucket went negative; purging");
        }
        map.remove(&date);
    }
}

fn timestamp_to_date(timestamp_ms: i64) -> NaiveDate {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

fn first_of_month_offset(date: NaiveDate, months_offset: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months_offset;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12);
    NaiveDate::from_ymd_opt(year, month0 as u32 + 1, 1).expect("valid first-of-month date")
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() - from.year()) as i64 * 12 + (to.month0() as i64 - from.month0() as i64)
}
