//! Sitemap tree types.
//!
//! A [`Sitemap`] is one fetched document: either a list of pages or an index
//! of further sitemaps. The kind names serialize exactly as the node types of
//! the ultimate-sitemap-parser family, which MCP clients already understand.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Priority assumed when a page omits `<priority>` or gives an invalid one.
pub const DEFAULT_PRIORITY: f64 = 0.5;

/// Type of a sitemap node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SitemapKind {
    /// Synthetic root for a whole site.
    #[serde(rename = "IndexWebsiteSitemap")]
    IndexWebsite,
    /// `robots.txt` with `Sitemap:` directives.
    #[serde(rename = "IndexRobotsTxtSitemap")]
    IndexRobotsTxt,
    /// XML `<sitemapindex>`.
    #[serde(rename = "IndexXMLSitemap")]
    IndexXml,
    /// XML `<urlset>`, including Google News sitemaps.
    #[serde(rename = "PagesXMLSitemap")]
    PagesXml,
    /// Plain-text list of URLs.
    #[serde(rename = "PagesTextSitemap")]
    PagesText,
    /// RSS 2.0 feed.
    #[serde(rename = "PagesRSSSitemap")]
    PagesRss,
    /// Atom feed.
    #[serde(rename = "PagesAtomSitemap")]
    PagesAtom,
    /// Document that could not be fetched or parsed.
    #[serde(rename = "InvalidSitemap")]
    Invalid,
}

impl SitemapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SitemapKind::IndexWebsite => "IndexWebsiteSitemap",
            SitemapKind::IndexRobotsTxt => "IndexRobotsTxtSitemap",
            SitemapKind::IndexXml => "IndexXMLSitemap",
            SitemapKind::PagesXml => "PagesXMLSitemap",
            SitemapKind::PagesText => "PagesTextSitemap",
            SitemapKind::PagesRss => "PagesRSSSitemap",
            SitemapKind::PagesAtom => "PagesAtomSitemap",
            SitemapKind::Invalid => "InvalidSitemap",
        }
    }

    /// Whether nodes of this kind hold sub-sitemaps rather than pages.
    pub fn is_index(&self) -> bool {
        matches!(self, SitemapKind::IndexWebsite | SitemapKind::IndexRobotsTxt | SitemapKind::IndexXml)
    }
}

impl fmt::Display for SitemapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a page is expected to change (`<changefreq>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl FromStr for ChangeFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            other => Err(format!("unknown change frequency '{other}'")),
        }
    }
}

/// Google News metadata (`<news:news>`), also filled from RSS/Atom items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsStory {
    pub title: String,
    pub publish_date: Option<DateTime<FixedOffset>>,
    pub publication_name: Option<String>,
    pub publication_language: Option<String>,
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stock_tickers: Vec<String>,
}

/// Image attached to a page (`<image:image>`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitemapImage {
    pub loc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// Localized alternate of a page (`<xhtml:link rel="alternate">`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternate {
    pub hreflang: String,
    pub href: String,
}

/// One page entry of a sitemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapPage {
    pub url: String,
    pub priority: f64,
    #[serde(default)]
    pub last_modified: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub change_frequency: Option<ChangeFrequency>,
    #[serde(default)]
    pub news_story: Option<NewsStory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<SitemapImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<Alternate>,
}

impl SitemapPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: DEFAULT_PRIORITY,
            last_modified: None,
            change_frequency: None,
            news_story: None,
            images: Vec::new(),
            alternates: Vec::new(),
        }
    }
}

/// Parse a `<priority>` value; anything outside 0.0..=1.0 falls back to the default.
pub fn parse_priority(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(p) if (0.0..=1.0).contains(&p) => p,
        _ => DEFAULT_PRIORITY,
    }
}

/// A node of the sitemap tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sitemap {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: SitemapKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Pages listed directly in this document.
    #[serde(default)]
    pub pages: Vec<SitemapPage>,
    #[serde(default)]
    pub sub_sitemaps: Vec<Sitemap>,
}

impl Sitemap {
    pub fn with_pages(url: impl Into<String>, kind: SitemapKind, pages: Vec<SitemapPage>) -> Self {
        Self { url: url.into(), kind, reason: None, pages, sub_sitemaps: Vec::new() }
    }

    pub fn index(url: impl Into<String>, kind: SitemapKind, sub_sitemaps: Vec<Sitemap>) -> Self {
        Self { url: url.into(), kind, reason: None, pages: Vec::new(), sub_sitemaps }
    }

    pub fn invalid(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: SitemapKind::Invalid,
            reason: Some(reason.into()),
            pages: Vec::new(),
            sub_sitemaps: Vec::new(),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.kind == SitemapKind::Invalid
    }

    /// Every node below this one, depth-first in document order. Does not include `self`.
    pub fn all_sitemaps(&self) -> Descendants<'_> {
        Descendants { stack: self.sub_sitemaps.iter().rev().collect() }
    }

    /// Every page in this node and all of its descendants, in document order.
    pub fn all_pages(&self) -> impl Iterator<Item = &SitemapPage> + '_ {
        std::iter::once(self)
            .chain(self.all_sitemaps())
            .flat_map(|sitemap| sitemap.pages.iter())
    }

    /// First descendant whose URL is exactly `url`.
    pub fn find_sitemap(&self, url: &str) -> Option<&Sitemap> {
        self.all_sitemaps().find(|sitemap| sitemap.url == url)
    }

    pub fn page_count(&self) -> usize {
        self.all_pages().count()
    }

    pub fn sitemap_count(&self) -> usize {
        self.all_sitemaps().count()
    }

    /// Client-facing shape of this subtree.
    ///
    /// Pages are included only when `with_pages` is set; `sub_sitemaps` only
    /// appears on index kinds.
    pub fn to_view(&self, with_pages: bool) -> SitemapView<'_> {
        SitemapView {
            url: &self.url,
            kind: self.kind,
            reason: self.reason.as_deref(),
            pages: (with_pages && !self.kind.is_index()).then_some(self.pages.as_slice()),
            sub_sitemaps: self
                .kind
                .is_index()
                .then(|| self.sub_sitemaps.iter().map(|s| s.to_view(with_pages)).collect()),
        }
    }
}

/// Pre-order iterator over the descendants of a [`Sitemap`].
pub struct Descendants<'a> {
    stack: Vec<&'a Sitemap>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Sitemap;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.sub_sitemaps.iter().rev());
        Some(next)
    }
}

/// Serializable, borrowed view of a sitemap subtree.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapView<'a> {
    pub url: &'a str,
    #[serde(rename = "type")]
    pub kind: SitemapKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<&'a [SitemapPage]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_sitemaps: Option<Vec<SitemapView<'a>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Sitemap {
        let news = Sitemap::with_pages(
            "https://example.com/news.xml",
            SitemapKind::PagesXml,
            vec![SitemapPage::new("https://example.com/news/1")],
        );
        let posts = Sitemap::with_pages(
            "https://example.com/posts.xml",
            SitemapKind::PagesXml,
            vec![SitemapPage::new("https://example.com/a"), SitemapPage::new("https://example.com/b")],
        );
        let index = Sitemap::index("https://example.com/sitemap_index.xml", SitemapKind::IndexXml, vec![posts, news]);
        let broken = Sitemap::invalid("https://example.com/missing.xml", "HTTP_ERROR: status 404");
        let robots = Sitemap::index("https://example.com/robots.txt", SitemapKind::IndexRobotsTxt, vec![index, broken]);
        Sitemap::index("https://example.com/", SitemapKind::IndexWebsite, vec![robots])
    }

    #[test]
    fn test_all_sitemaps_is_preorder() {
        let tree = sample_tree();
        let urls: Vec<&str> = tree.all_sitemaps().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/robots.txt",
                "https://example.com/sitemap_index.xml",
                "https://example.com/posts.xml",
                "https://example.com/news.xml",
                "https://example.com/missing.xml",
            ]
        );
        assert_eq!(tree.sitemap_count(), 5);
    }

    #[test]
    fn test_all_pages_in_document_order() {
        let tree = sample_tree();
        let urls: Vec<&str> = tree.all_pages().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b", "https://example.com/news/1"]);
        assert_eq!(tree.page_count(), 3);
    }

    #[test]
    fn test_find_sitemap() {
        let tree = sample_tree();
        let found = tree.find_sitemap("https://example.com/news.xml").unwrap();
        assert_eq!(found.pages.len(), 1);
        assert!(tree.find_sitemap("https://example.com/").is_none());
    }

    #[test]
    fn test_view_without_pages() {
        let tree = sample_tree();
        let json = serde_json::to_value(tree.to_view(false)).unwrap();
        assert_eq!(json["type"], "IndexWebsiteSitemap");
        let robots = &json["sub_sitemaps"][0];
        assert_eq!(robots["type"], "IndexRobotsTxtSitemap");
        let posts = &robots["sub_sitemaps"][0]["sub_sitemaps"][0];
        assert_eq!(posts["type"], "PagesXMLSitemap");
        assert!(posts.get("pages").is_none());
        assert!(posts.get("sub_sitemaps").is_none());
        let broken = &robots["sub_sitemaps"][1];
        assert_eq!(broken["type"], "InvalidSitemap");
        assert_eq!(broken["reason"], "HTTP_ERROR: status 404");
    }

    #[test]
    fn test_view_with_pages() {
        let tree = sample_tree();
        let json = serde_json::to_value(tree.to_view(true)).unwrap();
        let posts = &json["sub_sitemaps"][0]["sub_sitemaps"][0]["sub_sitemaps"][0];
        assert_eq!(posts["pages"][1]["url"], "https://example.com/b");
        assert_eq!(posts["pages"][1]["priority"], 0.5);
        assert!(json.get("pages").is_none());
    }

    #[test]
    fn test_tree_json_roundtrip_preserves_structure() {
        let tree = sample_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let back: Sitemap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority("0.8"), 0.8);
        assert_eq!(parse_priority(" 1.0 "), 1.0);
        assert_eq!(parse_priority("1.5"), DEFAULT_PRIORITY);
        assert_eq!(parse_priority("-0.1"), DEFAULT_PRIORITY);
        assert_eq!(parse_priority("high"), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_change_frequency_parse() {
        assert_eq!("Daily".parse::<ChangeFrequency>().unwrap(), ChangeFrequency::Daily);
        assert_eq!(" never ".parse::<ChangeFrequency>().unwrap(), ChangeFrequency::Never);
        assert!("sometimes".parse::<ChangeFrequency>().is_err());
    }

    #[test]
    fn test_kind_helpers() {
        assert!(SitemapKind::IndexXml.is_index());
        assert!(!SitemapKind::PagesRss.is_index());
        assert_eq!(SitemapKind::PagesXml.to_string(), "PagesXMLSitemap");
        assert_eq!(serde_json::to_value(SitemapKind::PagesText).unwrap(), "PagesTextSitemap");
    }
}
