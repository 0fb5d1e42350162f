use crate::UrlError;
use url::Url;

/// Schemes that never lead to a fetchable document
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Parses an absolute HTTP(S) URL
///
/// # Examples
///
/// ```
/// use site_harvester::url::parse_http_url;
///
/// assert!(parse_http_url("https://example.com/fr-ca/").is_ok());
/// assert!(parse_http_url("ftp://example.com/file").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Resolves an `href`/`src` attribute value against the page it appears on
///
/// Returns `None` for links that never name another document:
/// - empty values and fragment-only anchors (`#section`)
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - anything that does not resolve to an HTTP(S) URL
///
/// The fragment of the resolved URL is removed so `/page#a` and `/page`
/// dedupe to the same entry.
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}
