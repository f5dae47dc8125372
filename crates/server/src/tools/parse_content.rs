//! parse_sitemap_content tool implementation.
//!
//! Parses sitemap content supplied inline. No network requests are made:
//! entries of an inline sitemap index are reported as not fetched.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sitemap_client::SitemapTreeBuilder;
use sitemap_core::Error;

use super::{json_result, parse_url};
use crate::service::SitemapService;

/// Input parameters for parse_sitemap_content tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ParseContentParams {
    /// The content of the sitemap (XML, text, robots.txt, RSS or Atom).
    pub content: String,

    /// Optional URL the content was served from; used to resolve relative
    /// locations and to recognize robots.txt.
    #[serde(default)]
    pub sitemap_url: Option<String>,

    /// Whether to include page details in the response.
    #[serde(default)]
    pub include_pages: bool,
}

/// Implementation of the parse_sitemap_content tool.
pub async fn parse_impl(service: &SitemapService, params: ParseContentParams) -> Result<CallToolResult, McpError> {
    if params.content.trim().is_empty() {
        return Err(Error::InvalidInput("content cannot be empty".into()).into());
    }

    let config = service.builder().config().clone();
    if params.content.len() > config.max_bytes {
        return Err(Error::InvalidInput(format!(
            "content is {} bytes, limit is {}",
            params.content.len(),
            config.max_bytes
        ))
        .into());
    }

    let sitemap_url = match params.sitemap_url.as_deref() {
        Some(raw) => parse_url("sitemap_url", raw)?.to_string(),
        None => String::new(),
    };

    tracing::info!("Parsing sitemap from content ({} bytes)", params.content.len());

    let tree = SitemapTreeBuilder::offline(config).sitemap_from_str(&params.content, &sitemap_url).await;
    if let Some(reason) = &tree.reason {
        tracing::debug!("inline sitemap is invalid: {}", reason);
    }

    json_result(&tree.to_view(params.include_pages))
}
