//! cache_tune tool implementation.
//!
//! Adjusts cache sizes and TTLs at runtime. Shrinking a cache trims it
//! oldest-first right away.

use std::time::Duration;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use seoscope_client::Analyzer;

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_tune tool. At least one field is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheTuneParams {
    /// Maximum number of cached analyses.
    #[serde(default)]
    pub max_cache_size: Option<usize>,

    /// Maximum number of cached link verdicts.
    #[serde(default)]
    pub max_link_cache_size: Option<usize>,

    /// Analysis cache TTL in seconds.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,

    /// Link cache TTL in seconds.
    #[serde(default)]
    pub link_cache_ttl_secs: Option<u64>,
}

impl CacheTuneParams {
    fn validate(&self) -> Result<(), ToolError> {
        if self.max_cache_size.is_none()
            && self.max_link_cache_size.is_none()
            && self.cache_ttl_secs.is_none()
            && self.link_cache_ttl_secs.is_none()
        {
            return Err(ToolError::InvalidInput("at least one setting must be provided".into()));
        }

        let zero = [
            ("max_cache_size", self.max_cache_size.map(|v| v == 0)),
            ("max_link_cache_size", self.max_link_cache_size.map(|v| v == 0)),
            ("cache_ttl_secs", self.cache_ttl_secs.map(|v| v == 0)),
            ("link_cache_ttl_secs", self.link_cache_ttl_secs.map(|v| v == 0)),
        ];
        if let Some((field, _)) = zero.iter().find(|(_, is_zero)| *is_zero == Some(true)) {
            return Err(ToolError::InvalidInput(format!("{field} must be greater than 0")));
        }

        Ok(())
    }
}

/// Implementation of the cache_tune tool.
pub async fn tune_impl(analyzer: &Analyzer, params: CacheTuneParams) -> Result<CallToolResult, McpError> {
    params.validate()?;

    if let Some(size) = params.max_cache_size {
        analyzer.set_max_cache_size(size).await;
    }
    if let Some(size) = params.max_link_cache_size {
        analyzer.set_max_link_cache_size(size).await;
    }
    if let Some(secs) = params.cache_ttl_secs {
        analyzer.set_cache_ttl(Duration::from_secs(secs)).await;
    }
    if let Some(secs) = params.link_cache_ttl_secs {
        analyzer.set_link_cache_ttl(Duration::from_secs(secs)).await;
    }

    tracing::info!(?params, "cache settings updated");
    json_result(&analyzer.cache_stats().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{analyzer, output};

    #[tokio::test]
    async fn test_tune_applies_settings() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(&dir).await;
        analyzer.analyze("https://example.com/1").await.unwrap();
        analyzer.analyze("https://example.com/2").await.unwrap();

        let params = CacheTuneParams { max_cache_size: Some(1), cache_ttl_secs: Some(120), ..Default::default() };
        let out = output(&tune_impl(&analyzer, params).await.unwrap());

        assert_eq!(out["max_cache_size"], 1);
        assert_eq!(out["analysis_entries"], 1);
        assert_eq!(out["analysis_cache_ttl_secs"], 120);
        assert_eq!(out["link_cache_ttl_secs"], 600);
        assert!(analyzer.is_cached("https://example.com/2").await);

        analyzer.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_tune_requires_a_setting() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = analyzer(&dir).await;

        let err = tune_impl(&analyzer, CacheTuneParams::default()).await.unwrap_err();
        assert_eq!(err.code.0, -32602);

        analyzer.shutdown().await.unwrap();
    }

    #[test]
    fn test_zero_values_rejected() {
        let params = CacheTuneParams { link_cache_ttl_secs: Some(0), ..Default::default() };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("link_cache_ttl_secs"));
    }
}
