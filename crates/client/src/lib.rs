//! Client code for mcp-sitemap.
//!
//! This crate provides the HTTP fetch pipeline and the sitemap parser and
//! tree builder used by the server.

pub mod fetch;
pub mod sitemap;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, canonicalize, strip_to_homepage};
pub use sitemap::{
    ChangeFrequency, NewsStory, Sitemap, SitemapKind, SitemapPage, SitemapSource, SitemapTreeBuilder, SitemapView,
    StaticSource, TreeConfig,
};
