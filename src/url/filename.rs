use sha2::{Digest, Sha256};

/// Builds a filesystem-safe, collision-resistant file name for a URL
///
/// The name is derived from the URL's last path segment (or `index` when that
/// is empty), with every character other than alphanumerics, `_`, `-` and `.`
/// replaced by `_` and its own extension dropped. An 8-hex-character digest of
/// the full URL keeps distinct URLs apart, and `page_number` adds a
/// `_page_NNN` marker for multi-page content. A missing extension becomes `.txt`.
///
/// # Examples
///
/// ```
/// use site_harvester::url::sanitize_filename;
///
/// let a = sanitize_filename("https://example.com/a/report.pdf", ".pdf", None);
/// let b = sanitize_filename("https://example.com/b/report.pdf", ".pdf", None);
/// assert!(a.starts_with("report_") && a.ends_with(".pdf"));
/// assert_ne!(a, b);
/// ```
pub fn sanitize_filename(url: &str, extension: &str, page_number: Option<u32>) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let url_hash = &hex::encode(digest)[..8];

    let last_segment = url.rsplit('/').next().unwrap_or("");
    let last_segment = if last_segment.is_empty() {
        "index"
    } else {
        last_segment
    };

    let cleaned: String = last_segment
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let name = strip_extension(&cleaned);
    let extension = if extension.is_empty() {
        ".txt"
    } else {
        extension
    };

    match page_number {
        Some(page) => format!("{}_page_{:03}_{}{}", name, page, url_hash, extension),
        None => format!("{}_{}{}", name, url_hash, extension),
    }
}

/// Drops the last `.ext` of a name; leading dots are part of the name
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
