//! Per-month statistics record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one calendar month.
///
/// Field names are the on-disk names in `stats.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    /// `YYYY-MM` key of the bucket.
    #[serde(default)]
    pub month: String,

    #[serde(default)]
    pub analysis_hits: u64,
    #[serde(default)]
    pub analysis_misses: u64,
    #[serde(default)]
    pub link_hits: u64,
    #[serde(default)]
    pub link_misses: u64,

    /// Visitor identifier (client IP) to last-seen time.
    #[serde(default)]
    pub unique_visitors: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    pub analysis_requests: u64,
    #[serde(default)]
    pub error_count: u64,
    /// Analyzed URL to request count.
    #[serde(default)]
    pub popular_urls: BTreeMap<String, u64>,
    /// Accumulated analysis time in milliseconds.
    #[serde(default)]
    pub total_load_time: f64,
    #[serde(default)]
    pub total_requests: u64,

    #[serde(default)]
    pub last_updated: DateTime<Utc>,
}

impl MonthlyStats {
    pub fn new(month: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            month: month.into(),
            analysis_hits: 0,
            analysis_misses: 0,
            link_hits: 0,
            link_misses: 0,
            unique_visitors: BTreeMap::new(),
            analysis_requests: 0,
            error_count: 0,
            popular_urls: BTreeMap::new(),
            total_load_time: 0.0,
            total_requests: 0,
            last_updated: now,
        }
    }

    /// Fold `other` into `self` additively.
    ///
    /// Counters and URL counts are summed, visitors are unioned (an existing
    /// last-seen time wins), and the later `last_updated` is kept.
    pub fn absorb(&mut self, other: &MonthlyStats) {
        for (visitor, seen) in &other.unique_visitors {
            self.unique_visitors.entry(visitor.clone()).or_insert(*seen);
        }
        for (url, count) in &other.popular_urls {
            *self.popular_urls.entry(url.clone()).or_insert(0) += count;
        }

        self.analysis_hits += other.analysis_hits;
        self.analysis_misses += other.analysis_misses;
        self.link_hits += other.link_hits;
        self.link_misses += other.link_misses;
        self.analysis_requests += other.analysis_requests;
        self.error_count += other.error_count;
        self.total_load_time += other.total_load_time;
        self.total_requests += other.total_requests;

        if other.last_updated > self.last_updated {
            self.last_updated = other.last_updated;
        }
    }

    pub fn unique_visitor_count(&self) -> usize {
        self.unique_visitors.len()
    }

    /// Mean analysis time in milliseconds, 0 when nothing was tracked.
    pub fn average_load_time_ms(&self) -> f64 {
        if self.total_requests == 0 { 0.0 } else { self.total_load_time / self.total_requests as f64 }
    }

    /// Errors as a percentage of requests, smoothed so an empty month reads 0.
    pub fn error_rate(&self) -> f64 {
        self.error_count as f64 / (self.total_requests + 1) as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_absorb_sums_and_unions() {
        let mut base = MonthlyStats::new("2026-05", at(1));
        base.analysis_hits = 2;
        base.unique_visitors.insert("10.0.0.1".into(), at(1));
        base.popular_urls.insert("https://a.example/".into(), 3);

        let mut other = MonthlyStats::new("2026-05", at(4));
        other.analysis_hits = 5;
        other.link_misses = 1;
        other.total_load_time = 120.5;
        other.unique_visitors.insert("10.0.0.1".into(), at(3));
        other.unique_visitors.insert("10.0.0.2".into(), at(3));
        other.popular_urls.insert("https://a.example/".into(), 1);
        other.popular_urls.insert("https://b.example/".into(), 4);

        base.absorb(&other);

        assert_eq!(base.analysis_hits, 7);
        assert_eq!(base.link_misses, 1);
        assert_eq!(base.total_load_time, 120.5);
        assert_eq!(base.unique_visitor_count(), 2);
        assert_eq!(base.unique_visitors["10.0.0.1"], at(1));
        assert_eq!(base.popular_urls["https://a.example/"], 4);
        assert_eq!(base.popular_urls["https://b.example/"], 4);
        assert_eq!(base.last_updated, at(4));
    }

    #[test]
    fn test_derived_figures() {
        let mut stats = MonthlyStats::new("2026-05", at(1));
        assert_eq!(stats.average_load_time_ms(), 0.0);
        assert_eq!(stats.error_rate(), 0.0);

        stats.total_requests = 4;
        stats.total_load_time = 1000.0;
        stats.error_count = 1;
        assert_eq!(stats.average_load_time_ms(), 250.0);
        assert_eq!(stats.error_rate(), 20.0);
    }

    #[test]
    fn test_deserialize_tolerates_missing_fields() {
        let stats: MonthlyStats = serde_json::from_str(r#"{"analysis_hits": 3}"#).unwrap();
        assert_eq!(stats.analysis_hits, 3);
        assert!(stats.unique_visitors.is_empty());
        assert!(stats.popular_urls.is_empty());
    }
}
