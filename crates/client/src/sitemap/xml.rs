//! Streaming XML parser for sitemap documents.
//!
//! Recognized roots:
//! - `<urlset>`: pages, with Google News, image and `xhtml:link` extensions
//! - `<sitemapindex>`: child sitemap URLs
//! - `<rss>`: RSS 2.0 items
//! - `<feed>`: Atom entries
//!
//! Elements are matched on local name plus parent, so namespace prefixes do
//! not matter. Relative locations are resolved against the document URL.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use sitemap_core::Error;
use url::Url;

use super::date::parse_date;
use super::model::{Alternate, NewsStory, SitemapImage, SitemapPage, parse_priority};
use super::text::resolve_http_url;

/// Result of parsing an XML document.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlDocument {
    UrlSet(Vec<SitemapPage>),
    Index(Vec<String>),
    Rss(Vec<SitemapPage>),
    Atom(Vec<SitemapPage>),
    /// Well-formed start, but the root element is not a sitemap root.
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    UrlSet,
    Index,
    Rss,
    Atom,
}

impl Root {
    fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "urlset" => Some(Root::UrlSet),
            "sitemapindex" => Some(Root::Index),
            "rss" => Some(Root::Rss),
            "feed" => Some(Root::Atom),
            _ => None,
        }
    }
}

/// Parse `content` as a sitemap XML document.
///
/// A syntax error after at least one entry has been read keeps the entries
/// seen so far; truncated sitemaps are common in the wild.
pub fn parse_xml(content: &str, base: Option<&Url>) -> Result<XmlDocument, Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut collector: Option<Collector<'_>> = None;
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let message = format!("malformed XML at byte {}: {e}", reader.buffer_position());
                return match collector {
                    Some(c) if c.len() > 0 => {
                        tracing::warn!("{message}; keeping {} entries parsed so far", c.len());
                        Ok(c.finish())
                    }
                    _ => Err(Error::ParseFailed(message)),
                };
            }
        };

        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                match collector.as_mut() {
                    Some(c) => c.open(stack.last().map(String::as_str), &name, &e),
                    None => match Root::from_local_name(&name) {
                        Some(root) => collector = Some(Collector::new(root, base)),
                        None => return Ok(XmlDocument::Unsupported(name)),
                    },
                }
                stack.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                match collector.as_mut() {
                    Some(c) => c.open(stack.last().map(String::as_str), &name, &e),
                    None => match Root::from_local_name(&name) {
                        Some(root) => return Ok(Collector::new(root, base).finish()),
                        None => return Ok(XmlDocument::Unsupported(name)),
                    },
                }
            }
            Event::Text(e) => {
                let decoded = reader
                    .decoder()
                    .decode(&e)
                    .map_or_else(|_| String::from_utf8_lossy(&e).into_owned(), std::borrow::Cow::into_owned);
                text.push_str(&decoded);
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(&e).into_owned();
                text.push_str(&decode_entity(&entity));
            }
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => {
                if let Some(name) = stack.pop()
                    && let Some(c) = collector.as_mut()
                {
                    c.close(stack.last().map(String::as_str), &name, text.trim());
                }
                text.clear();
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    collector
        .map(Collector::finish)
        .ok_or_else(|| Error::ParseFailed("document has no root element".to_string()))
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Attribute value by local name.
fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes().flatten().find(|attr| attr.key.local_name().as_ref() == key.as_bytes()).map(|attr| {
        attr.unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), std::borrow::Cow::into_owned)
    })
}

fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "amp" => "&".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        s if s.starts_with('#') => {
            let code = match s.strip_prefix("#x").or_else(|| s.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => s[1..].parse::<u32>().ok(),
            };
            code.and_then(char::from_u32).map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Per-document parse state.
struct Collector<'b> {
    root: Root,
    base: Option<&'b Url>,
    pages: Vec<SitemapPage>,
    sitemaps: Vec<String>,
    seen: HashSet<String>,

    page: Option<SitemapPage>,
    news: Option<NewsStory>,
    image: Option<SitemapImage>,
    loc: Option<String>,
    fallback_url: Option<String>,
    published: Option<DateTime<FixedOffset>>,
}

impl<'b> Collector<'b> {
    fn new(root: Root, base: Option<&'b Url>) -> Self {
        Self {
            root,
            base,
            pages: Vec::new(),
            sitemaps: Vec::new(),
            seen: HashSet::new(),
            page: None,
            news: None,
            image: None,
            loc: None,
            fallback_url: None,
            published: None,
        }
    }

    fn len(&self) -> usize {
        self.pages.len() + self.sitemaps.len()
    }

    fn finish(self) -> XmlDocument {
        match self.root {
            Root::UrlSet => XmlDocument::UrlSet(self.pages),
            Root::Index => XmlDocument::Index(self.sitemaps),
            Root::Rss => XmlDocument::Rss(self.pages),
            Root::Atom => XmlDocument::Atom(self.pages),
        }
    }

    fn open(&mut self, parent: Option<&str>, name: &str, e: &BytesStart<'_>) {
        match (self.root, parent, name) {
            (Root::UrlSet, Some("urlset"), "url") => self.page = Some(SitemapPage::new("")),
            (Root::UrlSet, Some("url"), "news") => self.news = Some(NewsStory::default()),
            (Root::UrlSet, Some("url"), "image") => self.image = Some(SitemapImage::default()),
            (Root::UrlSet, Some("url"), "link") => {
                let is_alternate = attribute(e, "rel").is_some_and(|rel| rel.eq_ignore_ascii_case("alternate"));
                if let (true, Some(hreflang), Some(href), Some(page)) =
                    (is_alternate, attribute(e, "hreflang"), attribute(e, "href"), self.page.as_mut())
                {
                    page.alternates.push(Alternate { hreflang, href });
                }
            }
            (Root::Index, Some("sitemapindex"), "sitemap") => self.loc = None,
            (Root::Rss, Some("channel"), "item") | (Root::Atom, Some("feed"), "entry") => {
                self.page = Some(SitemapPage::new(""));
                self.news = Some(NewsStory::default());
                self.fallback_url = None;
                self.published = None;
            }
            (Root::Atom, Some("entry"), "link") => {
                let rel = attribute(e, "rel").unwrap_or_else(|| "alternate".to_string());
                if let (true, Some(href), Some(page)) = (rel == "alternate", attribute(e, "href"), self.page.as_mut())
                    && page.url.is_empty()
                {
                    page.url = href;
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, parent: Option<&str>, name: &str, text: &str) {
        match self.root {
            Root::UrlSet => self.close_urlset(parent, name, text),
            Root::Index => self.close_index(parent, name, text),
            Root::Rss => self.close_rss(parent, name, text),
            Root::Atom => self.close_atom(parent, name, text),
        }
    }

    fn close_urlset(&mut self, parent: Option<&str>, name: &str, text: &str) {
        match (parent, name) {
            (Some("urlset"), "url") => {
                if let Some(page) = self.page.take() {
                    self.push_page(page);
                }
            }
            (Some("url"), "news") => {
                if let (Some(news), Some(page)) = (self.news.take(), self.page.as_mut())
                    && !news.title.is_empty()
                {
                    page.news_story = Some(news);
                }
            }
            (Some("url"), "image") => {
                if let (Some(image), Some(page)) = (self.image.take(), self.page.as_mut())
                    && !image.loc.is_empty()
                {
                    page.images.push(image);
                }
            }
            (Some("url"), _) => {
                let Some(page) = self.page.as_mut() else { return };
                match name {
                    "loc" => page.url = text.to_string(),
                    "lastmod" => page.last_modified = parse_date(text),
                    "changefreq" => page.change_frequency = text.parse().ok(),
                    "priority" => page.priority = parse_priority(text),
                    _ => {}
                }
            }
            (Some("news"), _) => {
                let Some(news) = self.news.as_mut() else { return };
                match name {
                    "title" => news.title = text.to_string(),
                    "publication_date" => news.publish_date = parse_date(text),
                    "access" => news.access = non_empty(text),
                    "genres" => news.genres = split_list(text),
                    "keywords" => news.keywords = split_list(text),
                    "stock_tickers" => news.stock_tickers = split_list(text),
                    _ => {}
                }
            }
            (Some("publication"), _) => {
                let Some(news) = self.news.as_mut() else { return };
                match name {
                    "name" => news.publication_name = non_empty(text),
                    "language" => news.publication_language = non_empty(text),
                    _ => {}
                }
            }
            (Some("image"), _) => {
                let Some(image) = self.image.as_mut() else { return };
                match name {
                    "loc" => image.loc = text.to_string(),
                    "caption" => image.caption = non_empty(text),
                    "title" => image.title = non_empty(text),
                    "geo_location" => image.geo_location = non_empty(text),
                    "license" => image.license = non_empty(text),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn close_index(&mut self, parent: Option<&str>, name: &str, text: &str) {
        match (parent, name) {
            (Some("sitemap"), "loc") => self.loc = non_empty(text),
            (Some("sitemapindex"), "sitemap") => {
                let resolved = self.loc.take().and_then(|loc| resolve_http_url(&loc, self.base));
                match resolved {
                    Some(url) if self.seen.insert(url.clone()) => self.sitemaps.push(url),
                    Some(_) => {}
                    None => tracing::debug!("skipping sitemap index entry without a usable <loc>"),
                }
            }
            _ => {}
        }
    }

    fn close_rss(&mut self, parent: Option<&str>, name: &str, text: &str) {
        match (parent, name) {
            (Some("channel"), "item") => self.finish_feed_entry(),
            (Some("item"), _) => {
                let (Some(page), Some(news)) = (self.page.as_mut(), self.news.as_mut()) else { return };
                match name {
                    // RSS feeds often embed `<atom:link href=".."/>`; only a
                    // link with text counts and the first one wins.
                    "link" if page.url.is_empty() => page.url = text.to_string(),
                    "guid" => self.fallback_url = non_empty(text),
                    "title" => news.title = text.to_string(),
                    "pubDate" | "date" => self.published = self.published.or(parse_date(text)),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn close_atom(&mut self, parent: Option<&str>, name: &str, text: &str) {
        match (parent, name) {
            (Some("feed"), "entry") => self.finish_feed_entry(),
            (Some("entry"), _) => {
                let (Some(page), Some(news)) = (self.page.as_mut(), self.news.as_mut()) else { return };
                match name {
                    "id" => self.fallback_url = non_empty(text),
                    "title" => news.title = text.to_string(),
                    "updated" | "modified" => page.last_modified = parse_date(text),
                    "published" | "issued" => self.published = parse_date(text),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    /// Feed items carry their title and date as a news story; the page date
    /// prefers `updated` and falls back to the publication date.
    fn finish_feed_entry(&mut self) {
        let Some(mut page) = self.page.take() else { return };
        let mut news = self.news.take().unwrap_or_default();

        if page.url.is_empty()
            && let Some(fallback) = self.fallback_url.take()
        {
            page.url = fallback;
        }
        news.publish_date = self.published.take().or(page.last_modified);
        page.last_modified = page.last_modified.or(news.publish_date);
        if !news.title.is_empty() || news.publish_date.is_some() {
            page.news_story = Some(news);
        }
        self.push_page(page);
    }

    fn push_page(&mut self, mut page: SitemapPage) {
        let Some(url) = resolve_http_url(&page.url, self.base) else {
            tracing::debug!("skipping page with unusable location '{}'", page.url);
            return;
        };
        if self.seen.insert(url.clone()) {
            page.url = url;
            self.pages.push(page);
        }
    }
}
