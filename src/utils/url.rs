// src/utils/url.rs

//! URL inspection utilities.

use url::Url;

/// Extract the authority (host, plus port when non-default) from a URL.
///
/// # Examples
/// ```
/// use sitewatch::utils::url::domain_of;
///
/// assert_eq!(
///     domain_of("https://example.com/sitemap.xml"),
///     Some("example.com".to_string())
/// );
/// ```
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

/// Extract a summary keyword from a URL: the last non-empty path segment,
/// with query string and fragment stripped first.
///
/// Percent-encoding is reported verbatim. Returns `None` when the path has
/// no usable final segment (e.g. `https://example.com/`).
pub fn keyword_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let keyword = parsed
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .trim();

    if keyword.is_empty() {
        None
    } else {
        Some(keyword.to_string())
    }
}
