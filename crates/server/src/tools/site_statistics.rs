//! site_statistics tool implementation.
//!
//! Reports one month's usage counters together with the list of months
//! that have data.

use chrono::{DateTime, NaiveDate, Utc};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use seoscope_client::Analyzer;
use seoscope_core::MonthlyStats;
use seoscope_core::stats::current_month;

use super::json_result;
use crate::error::ToolError;

const TOP_URLS: usize = 10;

/// Parameters for the site_statistics tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SiteStatisticsParams {
    /// Month to report as `YYYY-MM`. Defaults to the current UTC month.
    #[serde(default)]
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PopularUrl {
    pub url: String,
    pub requests: u64,
}

/// One month's counters with derived rates.
#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub analysis_hits: u64,
    pub analysis_misses: u64,
    pub link_hits: u64,
    pub link_misses: u64,
    pub unique_visitors: usize,
    pub analysis_requests: u64,
    pub total_requests: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub average_load_time_ms: f64,
    pub popular_urls: Vec<PopularUrl>,
    pub last_updated: DateTime<Utc>,
}

impl From<&MonthlyStats> for MonthlyReport {
    fn from(stats: &MonthlyStats) -> Self {
        let mut popular: Vec<PopularUrl> = stats
            .popular_urls
            .iter()
            .map(|(url, requests)| PopularUrl { url: url.clone(), requests: *requests })
            .collect();
        popular.sort_by(|a, b| b.requests.cmp(&a.requests).then_with(|| a.url.cmp(&b.url)));
        popular.truncate(TOP_URLS);

        Self {
            analysis_hits: stats.analysis_hits,
            analysis_misses: stats.analysis_misses,
            link_hits: stats.link_hits,
            link_misses: stats.link_misses,
            unique_visitors: stats.unique_visitor_count(),
            analysis_requests: stats.analysis_requests,
            total_requests: stats.total_requests,
            error_count: stats.error_count,
            error_rate: stats.error_rate(),
            average_load_time_ms: stats.average_load_time_ms(),
            popular_urls: popular,
            last_updated: stats.last_updated,
        }
    }
}

/// Output from the site_statistics tool.
#[derive(Debug, Serialize)]
pub struct SiteStatisticsOutput {
    pub month: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<MonthlyReport>,
    /// Months with data, newest first.
    pub months: Vec<String>,
}

fn parse_month(month: &str) -> Result<String, ToolError> {
    let month = month.trim();
    let valid = month.len() == 7 && NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok();
    if valid { Ok(month.to_string()) } else { Err(ToolError::InvalidInput(format!("month must be YYYY-MM, got '{month}'"))) }
}

/// Implementation of the site_statistics tool.
pub async fn statistics_impl(analyzer: &Analyzer, params: SiteStatisticsParams) -> Result<CallToolResult, McpError> {
    let month = match params.month.as_deref() {
        Some(month) => parse_month(month)?,
        None => current_month(),
    };

    let store = analyzer.stats();
    let stats = store.monthly_stats(&month).await;
    let months = store.all_months().await;

    json_result(&SiteStatisticsOutput {
        found: stats.is_some(),
        stats: stats.as_ref().map(MonthlyReport::from),
        month,
        months,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{analyzer, output};

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month(" 2024-03 ").unwrap(), "2024-03");
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("2024-3").is_err());
        assert!(parse_month("March").is_err());
    }

    #[test]
    fn test_report_ranks_popular_urls() {
        let mut stats = MonthlyStats::new("2024-03", Utc::now());
        stats.popular_urls.insert("https://a.test/".into(), 2);
        stats.popular_urls.insert("https://b.test/".into(), 5);
        stats.total_requests = 3;
        stats.error_count = 1;
        stats.total_load_time = 300.0;

        let report = MonthlyReport::from(&stats);
        assert_eq!(report.popular_urls[0].url, "https://b.test/");
        assert_eq!(report.error_rate, 25.0);
        assert_eq!(report.average_load_time_ms, 100.0);
    }

    #[tokio::test]
    async fn test_current_month_after_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(&dir).await;
        analyzer.stats().track_visitor("10.0.0.1").await;
        analyzer.stats().track_analysis("https://example.com/", 12.0, false).await;

        let out = output(&statistics_impl(&analyzer, SiteStatisticsParams::default()).await.unwrap());
        assert_eq!(out["found"], true);
        assert_eq!(out["month"], current_month());
        assert_eq!(out["stats"]["unique_visitors"], 1);
        assert_eq!(out["stats"]["popular_urls"][0]["url"], "https://example.com/");
        assert_eq!(out["months"][0], current_month());

        analyzer.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_month_and_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(&dir).await;

        let params = SiteStatisticsParams { month: Some("1999-01".into()) };
        let out = output(&statistics_impl(&analyzer, params).await.unwrap());
        assert_eq!(out["found"], false);
        assert!(out.get("stats").is_none());

        let params = SiteStatisticsParams { month: Some("1999/01".into()) };
        let err = statistics_impl(&analyzer, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);

        analyzer.shutdown().await.unwrap();
    }
}
