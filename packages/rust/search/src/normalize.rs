//! Dedup keys and title cleanup for search hits.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Dedup key for a URL: lower-cased scheme, host, port and path, with the
/// query, fragment and trailing slash removed.
///
/// Returns `None` for unparseable or non-http(s) URLs.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_lowercase();

    let path = url.path().to_lowercase();
    let path = path.trim_end_matches('/');

    Some(match url.port() {
        Some(port) => format!("{}://{host}:{port}{path}", url.scheme()),
        None => format!("{}://{host}{path}", url.scheme()),
    })
}

/// Dedup key for a headline: case-folded with whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remove inline tags (e.g. `<b>` highlight markers) and decode the common
/// HTML entities found in provider titles.
pub fn strip_markup(raw: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    let without_tags = TAG_RE.replace_all(raw, "");
    let decoded = without_tags
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
