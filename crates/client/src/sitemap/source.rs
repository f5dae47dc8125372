//! Where sitemap documents come from.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use sitemap_core::Error;

use crate::fetch::FetchClient;

/// A source of raw sitemap documents, keyed by URL.
#[async_trait]
pub trait SitemapSource: Send + Sync {
    /// Raw body of the document at `url`. Compressed bodies are returned as-is.
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, Error>;
}

#[async_trait]
impl SitemapSource for FetchClient {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, Error> {
        Ok(self.fetch(url).await?.bytes)
    }
}

/// In-memory documents.
///
/// `StaticSource::offline()` serves nothing and reports every lookup as not
/// fetched, which is how inline content is parsed without touching the
/// network. Clones share one request counter.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: HashMap<String, Bytes>,
    offline: bool,
    requests: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self { offline: true, ..Self::default() }
    }

    /// Number of lookups served so far, hits and misses alike.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Builder-style insert.
    pub fn with(mut self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.documents.insert(url.into(), body.into());
    }
}

#[async_trait]
impl SitemapSource for StaticSource {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, Error> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if self.offline {
            return Err(Error::HttpError(format!("not fetched: {url} (network access disabled for inline content)")));
        }
        self.documents.get(url).cloned().ok_or_else(|| Error::HttpError(format!("status 404 for {url}")))
    }
}
