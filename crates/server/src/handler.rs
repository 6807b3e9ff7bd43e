//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use seoscope_client::Analyzer;

use crate::tools::cache::{clear_impl, status_impl, tune_impl};
use crate::tools::seo_analyze::analyze_impl;
use crate::tools::site_statistics::statistics_impl;
use crate::tools::{CacheStatusParams, CacheTuneParams, SeoAnalyzeParams, SiteStatisticsParams};

/// The main MCP server handler for seoscope.
#[derive(Clone)]
pub struct SeoScopeServer {
    tool_router: ToolRouter<Self>,
    analyzer: Arc<Analyzer>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SeoScopeServer {
    /// Create a new server handler around a shared analyzer.
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { tool_router: Self::tool_router(), analyzer }
    }

    /// Analyze a page for on-page SEO signals.
    ///
    /// Reports are cached per canonical URL; a repeat request within the TTL
    /// is answered from memory and flagged `cached`.
    #[tool(
        description = "Analyze a web page for SEO. Returns title, meta, heading, content, performance and link scores, an overall score, and recommendations."
    )]
    async fn seo_analyze(&self, params: Parameters<SeoAnalyzeParams>) -> Result<CallToolResult, McpError> {
        analyze_impl(&self.analyzer, params.0).await
    }

    #[tool(description = "Show analysis and link cache sizes, TTLs, and this month's hit/miss counters.")]
    async fn cache_status(&self, params: Parameters<CacheStatusParams>) -> Result<CallToolResult, McpError> {
        status_impl(&self.analyzer, params.0).await
    }

    #[tool(description = "Change cache capacities or TTLs at runtime. Shrinking a cache trims it immediately.")]
    async fn cache_tune(&self, params: Parameters<CacheTuneParams>) -> Result<CallToolResult, McpError> {
        tune_impl(&self.analyzer, params.0).await
    }

    #[tool(description = "Drop every cached analysis. Cached link verdicts are kept.")]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        clear_impl(&self.analyzer).await
    }

    /// Monthly usage statistics.
    #[tool(description = "Usage statistics for a month (YYYY-MM, default current): visitors, requests, error rate, load time, and popular URLs.")]
    async fn site_statistics(&self, params: Parameters<SiteStatisticsParams>) -> Result<CallToolResult, McpError> {
        statistics_impl(&self.analyzer, params.0).await
    }
}

impl ServerHandler for SeoScopeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "seoscope".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Use seo_analyze to audit a page; site_statistics and cache_status report usage.".into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
