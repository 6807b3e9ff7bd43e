//! MCP tool implementations.
//!
//! This module contains all tools exposed by the seoscope server.

pub mod cache;
pub mod seo_analyze;
pub mod site_statistics;

pub use cache::{CacheStatusParams, CacheTuneParams};
pub use seo_analyze::SeoAnalyzeParams;
pub use site_statistics::SiteStatisticsParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Serialize `output` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rmcp::model::CallToolResult;
    use seoscope_client::{Analyzer, FetchedPage, Fetcher, Prober};
    use seoscope_core::{AppConfig, Error, StatsOptions, StatsStore};
    use url::Url;

    pub(crate) const PAGE: &str = r#"<html><head><title>Fixture page</title></head><body>
        <h1>Fixture</h1>
        <a href="/a">a</a>
        <a href="https://elsewhere.test/">elsewhere</a>
    </body></html>"#;

    /// Serves [`PAGE`] for every URL except those whose path contains `fail`.
    pub(crate) struct StaticFetcher;

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, Error> {
            if url.path().contains("fail") {
                return Err(Error::HttpError(format!("{url}: status 500")));
            }
            Ok(FetchedPage::html(url.clone(), PAGE))
        }
    }

    pub(crate) struct AlwaysUp;

    #[async_trait]
    impl Prober for AlwaysUp {
        async fn probe(&self, _url: &str) -> bool {
            true
        }
    }

    pub(crate) async fn analyzer(dir: &tempfile::TempDir) -> Arc<Analyzer> {
        let stats = Arc::new(StatsStore::open(StatsOptions::new(dir.path())).await.unwrap());
        Arc::new(Analyzer::with_collaborators(&AppConfig::default(), stats, Arc::new(StaticFetcher), Arc::new(AlwaysUp)))
    }

    /// The JSON body of a successful tool result.
    pub(crate) fn output(result: &CallToolResult) -> serde_json::Value {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        let text = content.get("text").and_then(|v| v.as_str()).expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
