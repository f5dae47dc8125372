//! Format detection for a single decoded document.

use url::Url;

use super::model::{SitemapKind, SitemapPage};
use super::text::{has_sitemap_directive, robots_sitemaps, text_urls};
use super::xml::{XmlDocument, parse_xml};

/// What a document turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    Pages { kind: SitemapKind, pages: Vec<SitemapPage> },
    Index { kind: SitemapKind, sitemaps: Vec<String> },
    Invalid(String),
}

/// Classify and parse `content` fetched from `url`.
///
/// - Content starting with `<` is XML.
/// - A URL ending in `/robots.txt` is robots.txt. So is inline content
///   (`url` empty or unparseable) with a `Sitemap:` directive.
/// - Anything else is a plain-text URL list, which must contain at least one URL.
pub fn parse_document(url: &str, content: &str) -> ParsedDocument {
    let base = Url::parse(url).ok();
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let trimmed = content.trim_start();

    if trimmed.is_empty() {
        return ParsedDocument::Invalid("PARSE_FAILED: empty document".to_string());
    }

    if trimmed.starts_with('<') {
        return match parse_xml(trimmed, base.as_ref()) {
            Ok(XmlDocument::UrlSet(pages)) => ParsedDocument::Pages { kind: SitemapKind::PagesXml, pages },
            Ok(XmlDocument::Rss(pages)) => ParsedDocument::Pages { kind: SitemapKind::PagesRss, pages },
            Ok(XmlDocument::Atom(pages)) => ParsedDocument::Pages { kind: SitemapKind::PagesAtom, pages },
            Ok(XmlDocument::Index(sitemaps)) => ParsedDocument::Index { kind: SitemapKind::IndexXml, sitemaps },
            Ok(XmlDocument::Unsupported(root)) => {
                ParsedDocument::Invalid(format!("PARSE_FAILED: unsupported XML root element <{root}>"))
            }
            Err(e) => ParsedDocument::Invalid(e.to_string()),
        };
    }

    let is_robots = match &base {
        Some(base) => base.path().ends_with("/robots.txt"),
        None => has_sitemap_directive(content),
    };
    if is_robots {
        return ParsedDocument::Index {
            kind: SitemapKind::IndexRobotsTxt,
            sitemaps: robots_sitemaps(content, base.as_ref()),
        };
    }

    let urls = text_urls(content);
    if urls.is_empty() {
        return ParsedDocument::Invalid("PARSE_FAILED: no URLs found in text sitemap".to_string());
    }
    ParsedDocument::Pages { kind: SitemapKind::PagesText, pages: urls.into_iter().map(SitemapPage::new).collect() }
}
