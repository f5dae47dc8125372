//! Sitemap parsing and tree building.
//!
//! Supports XML sitemaps and sitemap indexes (optionally gzipped), Google
//! News, image and hreflang extensions, RSS 2.0 and Atom feeds, plain-text
//! URL lists and `robots.txt` directives.

mod body;
mod date;
mod document;
mod model;
mod source;
mod text;
mod tree;
mod xml;

pub use body::decode_body;
pub use date::parse_date;
pub use document::{ParsedDocument, parse_document};
pub use model::{
    Alternate, ChangeFrequency, DEFAULT_PRIORITY, Descendants, NewsStory, Sitemap, SitemapImage, SitemapKind,
    SitemapPage, SitemapView,
};
pub use source::{SitemapSource, StaticSource};
pub use tree::{SitemapTreeBuilder, TreeConfig, UNPUBLISHED_SITEMAP_PATHS};
