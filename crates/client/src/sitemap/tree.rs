//! Sitemap discovery and tree building.
//!
//! For a homepage the builder reads `robots.txt`, then probes well-known
//! sitemap paths that robots.txt did not already list. Every document that
//! fails to fetch or parse becomes an `InvalidSitemap` node; building a tree
//! never fails as a whole.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use sitemap_core::AppConfig;
use url::Url;

use super::body::decode_body;
use super::document::{ParsedDocument, parse_document};
use super::model::{Sitemap, SitemapKind};
use super::source::{SitemapSource, StaticSource};
use crate::fetch::strip_to_homepage;

/// Paths probed on every site in addition to the robots.txt directives.
pub const UNPUBLISHED_SITEMAP_PATHS: &[&str] = &[
    "sitemap.xml",
    "sitemap.xml.gz",
    "sitemap_index.xml",
    "sitemap-index.xml",
    "sitemap_index.xml.gz",
    "sitemap-index.xml.gz",
    ".sitemap.xml",
    "sitemap",
    "admin/config/search/xmlsitemap",
    "sitemap/sitemap-index.xml",
    "sitemap_news.xml",
    "sitemap-news.xml",
    "sitemap_news.xml.gz",
    "sitemap-news.xml.gz",
];

/// Limits for tree building.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Deepest nesting level that is still fetched; robots.txt and probed paths are level 0.
    pub max_depth: usize,
    /// Sub-sitemaps fetched at once per index.
    pub concurrency: usize,
    /// Limit on decompressed document size.
    pub max_bytes: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { max_depth: 10, concurrency: 4, max_bytes: 50 * 1024 * 1024 }
    }
}

impl From<&AppConfig> for TreeConfig {
    fn from(config: &AppConfig) -> Self {
        Self { max_depth: config.max_depth, concurrency: config.fetch_concurrency.max(1), max_bytes: config.max_bytes }
    }
}

/// Builds [`Sitemap`] trees from a [`SitemapSource`].
#[derive(Clone)]
pub struct SitemapTreeBuilder {
    source: Arc<dyn SitemapSource>,
    config: TreeConfig,
}

impl std::fmt::Debug for SitemapTreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitemapTreeBuilder").field("config", &self.config).finish_non_exhaustive()
    }
}

impl SitemapTreeBuilder {
    pub fn new(source: Arc<dyn SitemapSource>, config: TreeConfig) -> Self {
        Self { source, config }
    }

    /// Builder that never touches the network.
    pub fn offline(config: TreeConfig) -> Self {
        Self::new(Arc::new(StaticSource::offline()), config)
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Discover every sitemap of the site `url` belongs to.
    ///
    /// The root is an `IndexWebsiteSitemap` for the homepage. Its children are
    /// robots.txt (when it could be fetched) followed by every probed path
    /// that turned out to be a valid sitemap.
    pub async fn tree_for_homepage(&self, url: &Url) -> Sitemap {
        let homepage = strip_to_homepage(url);
        let robots_url = format!("{homepage}robots.txt");

        let mut children = Vec::new();
        let mut known: HashSet<String> = HashSet::new();

        let robots = self.fetch_sitemap(robots_url, 0, Vec::new()).await;
        if robots.is_invalid() {
            tracing::debug!("no usable robots.txt for {}: {}", homepage, robots.reason.as_deref().unwrap_or_default());
        } else {
            known.extend(robots.all_sitemaps().map(|s| s.url.clone()));
            children.push(robots);
        }

        let probes: Vec<String> = UNPUBLISHED_SITEMAP_PATHS
            .iter()
            .map(|path| format!("{homepage}{path}"))
            .filter(|candidate| !known.contains(candidate))
            .collect();

        let probed: Vec<Sitemap> = stream::iter(probes)
            .map(|candidate| self.fetch_sitemap(candidate, 0, Vec::new()))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        for sitemap in probed {
            if sitemap.is_invalid() {
                tracing::trace!("probe {} missed: {}", sitemap.url, sitemap.reason.as_deref().unwrap_or_default());
            } else {
                children.push(sitemap);
            }
        }

        Sitemap::index(homepage, SitemapKind::IndexWebsite, children)
    }

    /// Parse a document that is already in memory.
    ///
    /// Index entries are resolved through this builder's source; with an
    /// offline builder they become invalid "not fetched" nodes.
    pub async fn sitemap_from_str(&self, content: &str, url: &str) -> Sitemap {
        let parsed = parse_document(url, content);
        self.resolve(url.to_string(), parsed, 0, Vec::new()).await
    }

    fn fetch_sitemap(&self, url: String, depth: usize, ancestors: Vec<String>) -> BoxFuture<'_, Sitemap> {
        async move {
            if depth > self.config.max_depth {
                return Sitemap::invalid(url, format!("maximum sitemap depth of {} exceeded", self.config.max_depth));
            }
            if ancestors.contains(&url) {
                return Sitemap::invalid(url, "recursive sitemap reference");
            }

            let bytes = match self.source.fetch_bytes(&url).await {
                Ok(bytes) => bytes,
                Err(e) => return Sitemap::invalid(url, e.to_string()),
            };
            let content = match decode_body(&bytes, self.config.max_bytes) {
                Ok(content) => content,
                Err(e) => return Sitemap::invalid(url, e.to_string()),
            };

            let parsed = parse_document(&url, &content);
            self.resolve(url, parsed, depth, ancestors).await
        }
        .boxed()
    }

    async fn resolve(&self, url: String, parsed: ParsedDocument, depth: usize, mut ancestors: Vec<String>) -> Sitemap {
        match parsed {
            ParsedDocument::Pages { kind, pages } => {
                tracing::debug!("{} {} with {} pages", kind, url, pages.len());
                Sitemap::with_pages(url, kind, pages)
            }
            ParsedDocument::Index { kind, sitemaps } => {
                tracing::debug!("{} {} with {} sub-sitemaps", kind, url, sitemaps.len());
                ancestors.push(url.clone());
                let ancestors = &ancestors;
                let children: Vec<Sitemap> = stream::iter(sitemaps)
                    .map(|child| self.fetch_sitemap(child, depth + 1, ancestors.clone()))
                    .buffered(self.config.concurrency)
                    .collect()
                    .await;
                Sitemap::index(url, kind, children)
            }
            ParsedDocument::Invalid(reason) => {
                tracing::debug!("invalid sitemap {}: {}", url, reason);
                Sitemap::invalid(url, reason)
            }
        }
    }
}
