//! cache_clear tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use seoscope_client::Analyzer;

use crate::tools::json_result;

/// Output from the cache_clear tool.
#[derive(Debug, Serialize)]
pub struct CacheClearOutput {
    /// Analyses dropped from the cache.
    pub cleared: usize,
}

/// Implementation of the cache_clear tool. Link verdicts are kept.
pub async fn clear_impl(analyzer: &Analyzer) -> Result<CallToolResult, McpError> {
    let cleared = analyzer.cache_stats().await.analysis_entries;
    analyzer.clear_cache().await;
    json_result(&CacheClearOutput { cleared })
}
