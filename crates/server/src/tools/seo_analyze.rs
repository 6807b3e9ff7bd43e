//! seo_analyze tool implementation.
//!
//! Runs a cache-aware SEO analysis and records the request in the site
//! statistics.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use seoscope_client::{Analyzer, SeoAnalysis, canonicalize};
use tokio::time::Instant;

use super::json_result;
use crate::error::ToolError;

/// Parameters for the seo_analyze tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SeoAnalyzeParams {
    /// Page to analyze. The scheme defaults to https.
    pub url: String,

    /// Caller identifier (typically the client IP), counted as a unique visitor.
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Output from the seo_analyze tool.
#[derive(Debug, Serialize)]
pub struct SeoAnalyzeOutput<'a> {
    /// Whether the report was served from the analysis cache.
    pub cached: bool,
    pub analysis: &'a SeoAnalysis,
}

/// Implementation of the seo_analyze tool.
pub async fn analyze_impl(analyzer: &Analyzer, params: SeoAnalyzeParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url must not be empty".into()).into());
    }

    let stats = analyzer.stats();
    if let Some(client_id) = params.client_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        stats.track_visitor(client_id).await;
    }

    let started = Instant::now();
    let result = analyzer.analyze(&params.url).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    let tracked_url = canonicalize(&params.url).map(|url| url.to_string()).unwrap_or_else(|_| params.url.clone());
    stats.track_analysis(&tracked_url, elapsed_ms, result.is_err()).await;

    let analyzed = result.inspect_err(|e| tracing::warn!(url = %tracked_url, error = %e, "analysis failed"))?;
    json_result(&SeoAnalyzeOutput { cached: analyzed.cached, analysis: &analyzed.report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{analyzer, output};

    fn params(url: &str, client_id: Option<&str>) -> SeoAnalyzeParams {
        SeoAnalyzeParams { url: url.into(), client_id: client_id.map(str::to_string) }
    }

    #[tokio::test]
    async fn test_analyze_then_cached() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(&dir).await;

        let first = output(&analyze_impl(&analyzer, params("example.com", Some("10.0.0.1"))).await.unwrap());
        assert_eq!(first["cached"], false);
        assert_eq!(first["analysis"]["url"], "https://example.com/");
        assert_eq!(first["analysis"]["title"]["title"], "Fixture page");
        assert_eq!(first["analysis"]["links"]["internalLinks"], 1);

        let second = output(&analyze_impl(&analyzer, params("https://example.com/", None)).await.unwrap());
        assert_eq!(second["cached"], true);

        let stats = analyzer.stats().current_stats().await;
        assert_eq!(stats.analysis_requests, 2);
        assert_eq!(stats.popular_urls["https://example.com/"], 2);
        assert_eq!(stats.unique_visitor_count(), 1);
        assert_eq!(stats.error_count, 0);

        analyzer.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_analysis_counts_error() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(&dir).await;

        let err = analyze_impl(&analyzer, params("https://example.com/fail", None)).await.unwrap_err();
        assert_eq!(err.code.0, -32008);

        let stats = analyzer.stats().current_stats().await;
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.total_requests, 1);
        assert!(!analyzer.is_cached("https://example.com/fail").await);

        analyzer.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(&dir).await;

        let err = analyze_impl(&analyzer, params("  ", Some("10.0.0.1"))).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert_eq!(analyzer.stats().current_stats().await.analysis_requests, 0);

        analyzer.shutdown().await.unwrap();
    }
}
