//! get_sitemap_tree tool implementation.
//!
//! Fetches (or reads from cache) the sitemap tree of a site.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, parse_url};
use crate::service::SitemapService;

/// Input parameters for get_sitemap_tree tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SitemapTreeParams {
    /// The URL of the website homepage (e.g., https://example.com).
    pub url: String,

    /// Whether to include page details in the response.
    #[serde(default)]
    pub include_pages: bool,
}

/// Implementation of the get_sitemap_tree tool.
pub async fn tree_impl(service: &SitemapService, params: SitemapTreeParams) -> Result<CallToolResult, McpError> {
    let url = parse_url("url", &params.url)?;
    let tree = service.get_sitemap(&url).await;

    tracing::info!("Found {} pages and {} sitemaps for {}.", tree.page_count(), tree.sitemap_count(), url);

    json_result(&tree.to_view(params.include_pages))
}
