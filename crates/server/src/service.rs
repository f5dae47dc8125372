//! Cached access to sitemap trees.
//!
//! Trees are cached per homepage, so `https://example.com/blog` and
//! `https://example.com/` share one entry. Cache failures are logged and
//! never surface to tool callers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sitemap_client::{FetchClient, FetchConfig, Sitemap, SitemapTreeBuilder, TreeConfig, strip_to_homepage};
use sitemap_core::{AppConfig, CacheDb, Error};
use url::Url;

/// Sitemap tree lookups backed by the SQLite cache.
#[derive(Clone, Debug)]
pub struct SitemapService {
    cache: CacheDb,
    builder: SitemapTreeBuilder,
    max_age: Duration,
}

impl SitemapService {
    pub fn new(cache: CacheDb, builder: SitemapTreeBuilder, max_age: Duration) -> Self {
        Self { cache, builder, max_age }
    }

    /// Open the configured cache and a network-backed tree builder.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let cache = CacheDb::open_configured(config.db_path.as_deref()).await?;
        let client = FetchClient::new(FetchConfig::from(config))?;
        let builder = SitemapTreeBuilder::new(Arc::new(client), TreeConfig::from(config));
        Ok(Self::new(cache, builder, config.cache_max_age()))
    }

    pub fn builder(&self) -> &SitemapTreeBuilder {
        &self.builder
    }

    /// Sitemap tree for the site `url` belongs to, from cache when fresh.
    pub async fn get_sitemap(&self, url: &Url) -> Sitemap {
        let homepage = strip_to_homepage(url);

        match self.cache.get_tree(&homepage, self.max_age).await {
            Ok(Some(cached)) => match serde_json::from_str::<Sitemap>(&cached.tree_json) {
                Ok(tree) => {
                    tracing::info!("Using cached sitemap tree for {} (cache key: {})", url, homepage);
                    return tree;
                }
                Err(e) => tracing::warn!("discarding unreadable cache entry for {}: {}", homepage, e),
            },
            Ok(None) => tracing::debug!("cache miss for {}", homepage),
            Err(e) => tracing::warn!("cache lookup failed for {}: {}", homepage, e),
        }

        tracing::info!("Fetching sitemap tree for {}", url);
        let start = Instant::now();
        let tree = self.builder.tree_for_homepage(url).await;
        let (page_count, sitemap_count) = (tree.page_count(), tree.sitemap_count());

        match serde_json::to_string(&tree) {
            Ok(json) => {
                if let Err(e) = self.cache.put_tree(&homepage, &json, page_count, sitemap_count).await {
                    tracing::warn!("failed to cache sitemap tree for {}: {}", homepage, e);
                }
            }
            Err(e) => tracing::warn!("failed to encode sitemap tree for {}: {}", homepage, e),
        }

        tracing::info!(
            "Fetched sitemap tree for {} in {:.2} seconds ({} pages, {} sitemaps)",
            url,
            start.elapsed().as_secs_f64(),
            page_count,
            sitemap_count
        );
        tree
    }

    /// Drop rows that are already stale. Run at startup for persistent caches.
    pub async fn purge_stale(&self) {
        match self.cache.purge_stale_trees(self.max_age).await {
            Ok(0) => {}
            Ok(purged) => tracing::info!("Purged {} stale sitemap trees", purged),
            Err(e) => tracing::warn!("failed to purge stale sitemap trees: {}", e),
        }
    }

    /// Empty the cache. Run on shutdown.
    pub async fn clear(&self) {
        match self.cache.clear_trees().await {
            Ok(cleared) => tracing::info!("Sitemap cache cleared ({} entries)", cleared),
            Err(e) => tracing::warn!("failed to clear sitemap cache: {}", e),
        }
    }
}
