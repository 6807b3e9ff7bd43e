//! Site statistics bucketed by calendar month.
//!
//! Counters are kept in memory and persisted to `stats.json` in the data
//! directory. A legacy single-record `statistics.json` is folded into the
//! current month on first startup.

mod legacy;
pub mod month;
mod monthly;
mod store;

use std::path::PathBuf;
use std::time::Duration;

pub use month::{current_month, month_key, retained_month_keys};
pub use monthly::MonthlyStats;
pub use store::{LEGACY_STATS_FILE, STATS_FILE, StatsStore, StoreState};

/// Where and how often the statistics store persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsOptions {
    /// Directory holding `stats.json`.
    pub data_dir: PathBuf,
    /// Period of the background write, also the quiet time after which a
    /// mutation requests an early write.
    pub flush_interval: Duration,
    /// Months kept before the current one by the daily retention pass.
    /// `None` disables retention.
    pub retain_months: Option<u32>,
}

impl StatsOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), flush_interval: Duration::from_secs(60), retain_months: None }
    }
}
