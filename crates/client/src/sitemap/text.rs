//! Plain-text sitemaps and `robots.txt`.

use std::collections::HashSet;

use url::Url;

/// URLs from `Sitemap:` directives, resolved against `base` when relative.
///
/// The directive name is case-insensitive and `#` starts a comment.
/// Duplicates are dropped, first occurrence wins.
pub fn robots_sitemaps(content: &str, base: Option<&Url>) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .filter_map(sitemap_directive)
        .filter_map(|value| resolve_http_url(value, base))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Whether `content` contains at least one `Sitemap:` directive.
pub fn has_sitemap_directive(content: &str) -> bool {
    content.lines().any(|line| sitemap_directive(line).is_some())
}

fn sitemap_directive(line: &str) -> Option<&str> {
    let line = line.split('#').next().unwrap_or_default();
    let (key, value) = line.split_once(':')?;
    if !key.trim().eq_ignore_ascii_case("sitemap") {
        return None;
    }
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// One absolute http(s) URL per line; anything else is ignored.
pub fn text_urls(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| resolve_http_url(line, None))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Absolute http(s) URL for `value`, joined onto `base` if relative.
pub(crate) fn resolve_http_url(value: &str, base: Option<&Url>) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let url = match Url::parse(value) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(value).ok()?,
        Err(_) => return None,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
