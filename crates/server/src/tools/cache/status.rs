//! cache_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use seoscope_client::{Analyzer, CacheStats};

use crate::tools::json_result;

/// Parameters for the cache_status tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusParams {
    /// Also report whether this URL has a live cached analysis.
    #[serde(default)]
    pub url: Option<String>,
}

/// Output from the cache_status tool.
#[derive(Debug, Serialize)]
pub struct CacheStatusOutput {
    #[serde(flatten)]
    pub stats: CacheStats,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(analyzer: &Analyzer, params: CacheStatusParams) -> Result<CallToolResult, McpError> {
    let stats = analyzer.cache_stats().await;
    let mut cached = None;
    if let Some(url) = &params.url {
        cached = Some(analyzer.is_cached(url).await);
    }

    json_result(&CacheStatusOutput { stats, url: params.url, cached })
}
