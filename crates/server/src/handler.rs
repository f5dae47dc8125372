//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to the
//! appropriate implementations and serves the prompt templates.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult, Implementation,
        ListPromptsResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::prompts;
use crate::service::SitemapService;
use crate::tools::{
    ParseContentParams, SitemapPagesParams, SitemapStatsParams, SitemapTreeParams, parse_content::parse_impl,
    sitemap_pages::pages_impl, sitemap_stats::stats_impl, sitemap_tree::tree_impl,
};

const INSTRUCTIONS: &str = "This MCP server provides tools for analyzing website sitemaps.

# Getting Started
1. Use `get_sitemap_tree` to fetch the basic structure of a website's sitemap
2. Use `get_sitemap_pages` to retrieve all pages from a sitemap with filtering options
3. Use `get_sitemap_stats` for comprehensive statistics about a sitemap
4. Use `parse_sitemap_content` to parse raw sitemap XML content

All tools return JSON strings that can be parsed for further processing.";

/// The main MCP server handler for mcp-sitemap.
#[derive(Clone)]
pub struct McpSitemapServer {
    service: SitemapService,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl McpSitemapServer {
    /// Create a new server handler around a shared sitemap service.
    pub fn new(service: SitemapService) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    #[tool(description = "Fetch and parse the sitemap tree from a website URL")]
    async fn get_sitemap_tree(&self, params: Parameters<SitemapTreeParams>) -> Result<CallToolResult, McpError> {
        tree_impl(&self.service, params.0).await
    }

    /// List pages across the whole tree or one sub-sitemap.
    ///
    /// With `include_metadata` pages are sorted by most recently updated first.
    #[tool(description = "Get all pages from a website's sitemap with optional limits and filtering options. \
                          Supports filtering by route (e.g., '/blog') and specific sitemap URL.")]
    async fn get_sitemap_pages(&self, params: Parameters<SitemapPagesParams>) -> Result<CallToolResult, McpError> {
        pages_impl(&self.service, params.0).await
    }

    #[tool(description = "Get comprehensive statistics about a website's sitemap structure")]
    async fn get_sitemap_stats(&self, params: Parameters<SitemapStatsParams>) -> Result<CallToolResult, McpError> {
        stats_impl(&self.service, params.0).await
    }

    /// Parse sitemap content supplied by the caller. No network requests are made.
    #[tool(description = "Parse a sitemap directly from its XML or text content")]
    async fn parse_sitemap_content(&self, params: Parameters<ParseContentParams>) -> Result<CallToolResult, McpError> {
        parse_impl(&self.service, params.0).await
    }
}

impl ServerHandler for McpSitemapServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-sitemap".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().enable_prompts().build(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }

    async fn list_prompts(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(prompts::list()))
    }

    async fn get_prompt(
        &self, request: GetPromptRequestParam, _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        tracing::debug!("rendering prompt {}", request.name);
        prompts::get(&request.name, request.arguments.as_ref())
    }
}
