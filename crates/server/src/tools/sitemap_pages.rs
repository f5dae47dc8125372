//! get_sitemap_pages tool implementation.
//!
//! Lists pages of a site's sitemap tree, optionally restricted to one
//! sub-sitemap and/or a route prefix.
//!
//! ### Route matching
//! With `base` = `scheme://host[:port]` of the requested URL and a normalized
//! route (leading `/`, no trailing `/`), a page matches when its URL is
//! `base + route`, lies under `base + route + "/"`, or the route is `/`.

use std::time::Instant;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sitemap_client::SitemapPage;
use sitemap_client::fetch::site_origin;

use super::{json_result, parse_url};
use crate::service::SitemapService;

/// Input parameters for get_sitemap_pages tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SitemapPagesParams {
    /// The URL of the website homepage (e.g., https://example.com).
    pub url: String,

    /// Maximum number of pages to return (0 for no limit).
    #[serde(default)]
    pub limit: usize,

    /// Whether to include additional page metadata (priority, lastmod, etc.).
    /// Pages are then sorted by most recently updated first.
    #[serde(default)]
    pub include_metadata: bool,

    /// Optional route path to filter pages by (e.g., '/blog').
    #[serde(default)]
    pub route: Option<String>,

    /// Optional URL of a specific sitemap to get pages from.
    #[serde(default)]
    pub sitemap_url: Option<String>,
}

/// A page in the response: bare URL, or the full page with metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PageEntry<'a> {
    Url { url: &'a str },
    Full(&'a SitemapPage),
}

/// Output structure for get_sitemap_pages tool.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapPagesOutput<'a> {
    pub base_url: String,
    pub matching_pages: Vec<PageEntry<'a>>,
    pub total_matching_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Leading `/`, no trailing `/` unless the route is the root.
pub fn normalize_route(route: &str) -> String {
    let mut route = if route.starts_with('/') { route.to_string() } else { format!("/{route}") };
    while route.len() > 1 && route.ends_with('/') {
        route.pop();
    }
    route
}

/// Whether `page_url` belongs to `route` on `base`.
pub fn route_matches(page_url: &str, base: &str, route: &str) -> bool {
    let prefix = format!("{base}{route}");
    if !page_url.starts_with(&prefix) {
        return false;
    }
    route == "/" || page_url.len() == prefix.len() || page_url[prefix.len()..].starts_with('/')
}

/// Implementation of the get_sitemap_pages tool.
pub async fn pages_impl(service: &SitemapService, params: SitemapPagesParams) -> Result<CallToolResult, McpError> {
    let url = parse_url("url", &params.url)?;
    let sitemap_url = params.sitemap_url.as_deref().map(|s| parse_url("sitemap_url", s)).transpose()?;
    let route = params.route.as_deref().map(normalize_route);
    let base = site_origin(&url);

    let mut log = format!("Fetching sitemap pages for {url}");
    if let Some(route) = &route {
        log.push_str(&format!(" with route filter: {route}"));
    }
    if let Some(sitemap_url) = &sitemap_url {
        log.push_str(&format!(" with sitemap filter: {sitemap_url}"));
    }
    if params.limit > 0 {
        log.push_str(&format!(" (limit: {})", params.limit));
    }
    tracing::info!("{}", log);

    let start = Instant::now();
    let tree = service.get_sitemap(&url).await;

    let target = match &sitemap_url {
        None => &tree,
        Some(wanted) => match tree.find_sitemap(wanted.as_str()) {
            Some(found) => found,
            None => {
                tracing::warn!("Sitemap URL {} not found in the sitemap tree for {}", wanted, url);
                return json_result(&SitemapPagesOutput {
                    base_url: url.to_string(),
                    matching_pages: Vec::new(),
                    total_matching_pages: 0,
                    route: None,
                    sitemap_url: Some(wanted.to_string()),
                    warning: Some(format!("Sitemap URL {wanted} not found")),
                });
            }
        },
    };

    let matching = target
        .all_pages()
        .filter(|page| route.as_deref().is_none_or(|route| route_matches(&page.url, &base, route)));
    let mut pages: Vec<&SitemapPage> = match params.limit {
        0 => matching.collect(),
        limit => matching.take(limit).collect(),
    };

    let matching_pages: Vec<PageEntry<'_>> = if params.include_metadata {
        pages.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        pages.into_iter().map(PageEntry::Full).collect()
    } else {
        pages.into_iter().map(|page| PageEntry::Url { url: &page.url }).collect()
    };

    tracing::info!(
        "Fetched {} sitemap pages for {} in {:.2} seconds{}",
        matching_pages.len(),
        url,
        start.elapsed().as_secs_f64(),
        if params.include_metadata { " (sorted by most recently updated)" } else { "" }
    );

    json_result(&SitemapPagesOutput {
        base_url: url.to_string(),
        total_matching_pages: matching_pages.len(),
        matching_pages,
        route,
        sitemap_url: sitemap_url.map(|u| u.to_string()),
        warning: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::service::tests::{fixture_site, service_with};
    use crate::tools::tests::result_json;

    fn params(route: Option<&str>) -> SitemapPagesParams {
        SitemapPagesParams {
            url: "https://example.com".into(),
            limit: 0,
            include_metadata: false,
            route: route.map(str::to_string),
            sitemap_url: None,
        }
    }

    fn urls(json: &serde_json::Value) -> Vec<String> {
        json["matching_pages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["url"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("blog"), "/blog");
        assert_eq!(normalize_route("/blog/"), "/blog");
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route(""), "/");
    }

    #[test]
    fn test_route_matches() {
        let base = "https://example.com";
        assert!(route_matches("https://example.com/blog", base, "/blog"));
        assert!(route_matches("https://example.com/blog/", base, "/blog"));
        assert!(route_matches("https://example.com/blog/post", base, "/blog"));
        assert!(!route_matches("https://example.com/blogroll", base, "/blog"));
        assert!(!route_matches("https://other.com/blog", base, "/blog"));
        assert!(route_matches("https://example.com/anything", base, "/"));
    }

    #[tokio::test]
    async fn test_all_pages() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let json = result_json(&pages_impl(&service, params(None)).await.unwrap());
        assert_eq!(json["base_url"], "https://example.com/");
        assert_eq!(json["total_matching_pages"], 7);
        assert_eq!(json["matching_pages"][0], serde_json::json!({"url": "https://example.com/blog"}));
        assert!(json.get("route").is_none());
    }

    #[tokio::test]
    async fn test_route_filter() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let json = result_json(&pages_impl(&service, params(Some("blog/"))).await.unwrap());
        assert_eq!(
            urls(&json),
            vec!["https://example.com/blog", "https://example.com/blog/first", "https://example.com/blog/second"]
        );
        assert_eq!(json["route"], "/blog");
    }

    #[tokio::test]
    async fn test_limit() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let json = result_json(&pages_impl(&service, SitemapPagesParams { limit: 2, ..params(None) }).await.unwrap());
        assert_eq!(urls(&json), vec!["https://example.com/blog", "https://example.com/blog/first"]);
        assert_eq!(json["total_matching_pages"], 2);
    }

    #[tokio::test]
    async fn test_metadata_sorted_newest_first() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let request = SitemapPagesParams { include_metadata: true, ..params(Some("/blog")) };
        let json = result_json(&pages_impl(&service, request).await.unwrap());
        assert_eq!(
            urls(&json),
            vec!["https://example.com/blog/second", "https://example.com/blog", "https://example.com/blog/first"]
        );
        assert_eq!(json["matching_pages"][1]["priority"], 0.6);
    }

    #[tokio::test]
    async fn test_undated_pages_sort_last() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let request = SitemapPagesParams {
            include_metadata: true,
            sitemap_url: Some("https://example.com/posts.xml".into()),
            ..params(None)
        };
        let json = result_json(&pages_impl(&service, request).await.unwrap());
        assert_eq!(urls(&json).last().unwrap(), "https://example.com/blogroll");
        assert_eq!(json["sitemap_url"], "https://example.com/posts.xml");
    }

    #[tokio::test]
    async fn test_sitemap_filter() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let request = SitemapPagesParams { sitemap_url: Some("https://example.com/pages.xml".into()), ..params(None) };
        let json = result_json(&pages_impl(&service, request).await.unwrap());
        assert_eq!(urls(&json), vec!["https://example.com/", "https://example.com/about"]);
    }

    #[tokio::test]
    async fn test_unknown_sitemap_warns() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let request = SitemapPagesParams { sitemap_url: Some("https://example.com/nope.xml".into()), ..params(None) };
        let json = result_json(&pages_impl(&service, request).await.unwrap());
        assert_eq!(json["total_matching_pages"], 0);
        assert_eq!(json["warning"], "Sitemap URL https://example.com/nope.xml not found");
    }

    #[tokio::test]
    async fn test_invalid_sitemap_url() {
        let service = service_with(fixture_site(), Duration::from_secs(60)).await;
        let request = SitemapPagesParams { sitemap_url: Some("ftp://example.com/s.xml".into()), ..params(None) };
        let err = pages_impl(&service, request).await.unwrap_err();
        assert!(err.message.contains("sitemap_url"));
    }
}
