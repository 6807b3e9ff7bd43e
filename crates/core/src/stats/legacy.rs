//! Pre-monthly `statistics.json` format.
//!
//! Older deployments kept one unbucketed record with camelCase fields. On
//! startup it is folded into the current month and the file is renamed to
//! `statistics.json.bak` so the fold happens once.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::MonthlyStats;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct LegacyStatistics {
    unique_visitors: HashMap<String, DateTime<Utc>>,
    analysis_requests: u64,
    error_count: u64,
    popular_urls: HashMap<String, u64>,
    /// Mean analysis time in milliseconds.
    average_load_time: f64,
    total_requests: u64,
    last_persisted: Option<DateTime<Utc>>,
    analysis_cache_hits: u64,
    analysis_cache_misses: u64,
    link_cache_hits: u64,
    link_cache_misses: u64,
}

impl LegacyStatistics {
    pub(crate) fn parse(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    pub(crate) fn last_persisted(&self) -> Option<DateTime<Utc>> {
        self.last_persisted
    }

    /// Add this record to `target`. Visitors already present keep their time.
    pub(crate) fn fold_into(&self, target: &mut MonthlyStats, now: DateTime<Utc>) {
        for (visitor, seen) in &self.unique_visitors {
            target.unique_visitors.entry(visitor.clone()).or_insert(*seen);
        }
        for (url, count) in &self.popular_urls {
            *target.popular_urls.entry(url.clone()).or_insert(0) += count;
        }

        target.analysis_requests += self.analysis_requests;
        target.error_count += self.error_count;
        target.total_load_time += self.average_load_time * self.total_requests as f64;
        target.total_requests += self.total_requests;
        target.analysis_hits += self.analysis_cache_hits;
        target.analysis_misses += self.analysis_cache_misses;
        target.link_hits += self.link_cache_hits;
        target.link_misses += self.link_cache_misses;
        target.last_updated = now;
    }
}
