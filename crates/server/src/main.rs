//! seoscope server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use seoscope_client::Analyzer;
use seoscope_core::{AppConfig, StatsStore};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let stats = Arc::new(StatsStore::open(config.stats_options()).await.context("failed to open statistics store")?);
    let analyzer = Arc::new(Analyzer::new(&config, stats)?);

    tracing::info!(data_dir = %config.data_dir.display(), "Starting seoscope server on stdio transport");

    let handler = handler::SeoScopeServer::new(analyzer.clone());
    let server = serve_server(handler, stdio()).await?;

    tokio::select! {
        quit = server.waiting() => {
            let reason = quit?;
            tracing::info!(?reason, "client disconnected");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            tracing::info!("interrupt received");
        }
    }

    if let Err(e) = analyzer.shutdown().await {
        tracing::error!(error = %e, "final statistics write failed");
    }

    Ok(())
}
