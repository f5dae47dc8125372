//! Serving the handler over stdio or streamable HTTP.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use sitemap_core::{AppConfig, Transport};
use tokio::net::TcpListener;

use crate::handler::McpSitemapServer;

/// Path the streamable HTTP endpoint is mounted at.
pub const MCP_PATH: &str = "/mcp";

/// Serve until the client disconnects (stdio) or Ctrl-C (HTTP).
pub async fn serve(config: &AppConfig, handler: McpSitemapServer) -> Result<()> {
    match config.transport {
        Transport::Stdio => serve_stdio(handler).await,
        Transport::StreamableHttp => serve_http(config, handler).await,
    }
}

async fn serve_stdio(handler: McpSitemapServer) -> Result<()> {
    tracing::info!("Starting mcp-sitemap server on stdio transport");

    let server = serve_server(handler, stdio()).await?;
    tokio::select! {
        quit = server.waiting() => { quit?; }
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received, stopping server..."),
    }
    Ok(())
}

async fn serve_http(config: &AppConfig, handler: McpSitemapServer) -> Result<()> {
    let (host, port) = config.bind_addr()?;
    let listener = bind(host, port).await?;
    let addr = listener.local_addr()?;
    let service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    let app = axum::Router::new().nest_service(MCP_PATH, service);

    tracing::info!(address = %addr, "Starting mcp-sitemap server on http://{}{}", addr, MCP_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Bind `host:port`, resolving host names.
async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
