//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mcp-sitemap server. Every
//! tool answers with pretty-printed JSON text.

pub mod parse_content;
pub mod sitemap_pages;
pub mod sitemap_stats;
pub mod sitemap_tree;

pub use parse_content::ParseContentParams;
pub use sitemap_pages::SitemapPagesParams;
pub use sitemap_stats::SitemapStatsParams;
pub use sitemap_tree::SitemapTreeParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use sitemap_client::canonicalize;
use sitemap_core::Error;
use url::Url;

/// Validate and normalize a URL argument.
pub(crate) fn parse_url(field: &str, raw: &str) -> Result<Url, Error> {
    canonicalize(raw).map_err(|e| Error::InvalidUrl(format!("{field}: {e}. Please provide a valid HTTP or HTTPS URL.")))
}

/// Wrap `value` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize response: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
