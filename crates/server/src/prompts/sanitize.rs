//! Input cleaning for prompt arguments.
//!
//! Prompt text is handed to a model verbatim, so arguments are bounded in
//! length, stripped of control characters and, for URLs and routes,
//! validated before they are interpolated.

use std::sync::LazyLock;

use regex::Regex;
use sitemap_client::canonicalize;

/// Longest argument kept, in characters.
pub const MAX_INPUT_CHARS: usize = 1000;

static ROUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\-/]+$").expect("route pattern is valid"));

/// Truncate to [`MAX_INPUT_CHARS`] and drop ASCII control characters.
pub fn clean_text(input: &str) -> String {
    input
        .chars()
        .take(MAX_INPUT_CHARS)
        .filter(|c| !c.is_ascii_control())
        .collect()
}

/// Cleaned and canonicalized http(s) URL.
pub fn clean_url(input: &str) -> Option<String> {
    canonicalize(&clean_text(input)).ok().map(|url| url.to_string())
}

/// Cleaned route path: leading `/`, no query or fragment, word characters,
/// `-` and `/` only.
pub fn clean_route(input: &str) -> Option<String> {
    let text = clean_text(input);
    let mut route = if text.starts_with('/') { text } else { format!("/{text}") };
    if let Some(end) = route.find(['?', '#']) {
        route.truncate(end);
    }
    ROUTE_PATTERN.is_match(&route).then_some(route)
}
