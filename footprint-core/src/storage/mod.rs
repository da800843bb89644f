//! Storage collaborator boundary.
//!
//! `ActivityStore` owns activity records and their aggregates;
//! `KeyValueStore` is the preference store history and voice settings are
//! persisted to. Both are `Send + Sync` so one instance can be shared by the
//! engine and the host through an `Arc`.

pub mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::emissions::ActivityCategory;
use crate::error::Result;

/// Rolling window used for the weekly total and average.
pub const WEEK_DAYS: i64 = 7;
/// Rolling window used for the monthly total.
pub const MONTH_DAYS: i64 = 30;

/// One logged activity handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub category: ActivityCategory,
    /// Quantity in the unit the user spoke (km, liters, hours), or 1.0.
    pub quantity: f64,
    /// Derived emissions in kg CO2-equivalent.
    pub co2_amount: f64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregates shown on the dashboard and read by statistics commands.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_total: f64,
    pub yesterday_total: f64,
    pub week_total: f64,
    pub month_total: f64,
    pub weekly_average: f64,
    pub activity_count: usize,
}

impl DashboardStats {
    /// Aggregate records relative to `now` (UTC calendar days, rolling
    /// 7- and 30-day windows that include today).
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a ActivityRecord>,
        now: DateTime<Utc>,
    ) -> Self {
        let today = now.date_naive();
        let yesterday = today - Duration::days(1);
        let week_start = today - Duration::days(WEEK_DAYS - 1);
        let month_start = today - Duration::days(MONTH_DAYS - 1);

        let mut stats = DashboardStats::default();
        for record in records {
            let day = record.created_at.date_naive();
            if day > today {
                continue;
            }
            stats.activity_count += 1;
            if day == today {
                stats.today_total += record.co2_amount;
            }
            if day == yesterday {
                stats.yesterday_total += record.co2_amount;
            }
            if day >= week_start {
                stats.week_total += record.co2_amount;
            }
            if day >= month_start {
                stats.month_total += record.co2_amount;
            }
        }
        stats.weekly_average = stats.week_total / WEEK_DAYS as f64;
        stats
    }
}

/// Activity persistence and aggregate queries.
pub trait ActivityStore: Send + Sync {
    /// Persist a record and return its identifier. An empty identifier means
    /// the write did not happen.
    fn add_activity(&self, record: ActivityRecord) -> Result<String>;

    fn dashboard_stats(&self) -> Result<DashboardStats>;
}

/// String-keyed durable preference store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
