//! mcp-sitemap server entry point.
//!
//! Boots the MCP server on stdio or streamable HTTP, depending on
//! configuration. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use anyhow::Result;
use sitemap_core::AppConfig;

mod handler;
mod logging;
mod prompts;
mod service;
mod tools;
mod transport;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config)?;

    let service = service::SitemapService::from_config(&config).await?;
    service.purge_stale().await;
    tracing::info!("Sitemap server initialized");

    let result = transport::serve(&config, handler::McpSitemapServer::new(service.clone())).await;

    tracing::info!("Cleaning up sitemap cache");
    service.clear().await;

    result
}
