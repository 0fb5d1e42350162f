use url::Url;

/// Extracts the authority (host plus explicit port) from a URL
///
/// The host is lowercased; default ports are omitted by the `url` crate, so
/// `https://example.com:443/` and `https://example.com/` yield the same value.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvester::url::extract_authority;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(extract_authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}
