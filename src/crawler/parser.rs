//! HTML link discovery
//!
//! Extracts the outbound references of a page that the traversal may follow
//! or download.

use crate::url::resolve_href;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose references are followed
const LINK_ELEMENTS: &str = "a, link, embed, iframe, object";

/// Attributes checked, in order, for an element's target
const LINK_ATTRIBUTES: &[&str] = &["href", "src", "data"];

/// Extracts all followable links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:** `<a>`, `<link>`, `<embed>`, `<iframe>`, `<object>`, reading
/// `href`, then `src`, then `data`.
///
/// **Exclude:** fragment-only anchors, `javascript:`, `mailto:`, `tel:`,
/// `data:` links and anything that does not resolve to HTTP(S).
///
/// Returned URLs are absolute, fragment-free, in document order.
///
/// # Example
///
/// ```
/// use site_harvester::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/fr-ca/produit">Produit</a><embed src="fiche.pdf">"#;
/// let base = Url::parse("https://example.com/fr-ca/").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links[0].as_str(), "https://example.com/fr-ca/produit");
/// assert_eq!(links[1].as_str(), "https://example.com/fr-ca/fiche.pdf");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    links_in(document.root_element(), base_url)
}

/// Extracts followable links below (and including) an element
pub fn links_in(root: ElementRef<'_>, base_url: &Url) -> Vec<Url> {
    let selector = match Selector::parse(LINK_ELEMENTS) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    root.select(&selector)
        .filter_map(|element| link_target(&element))
        .filter_map(|href| resolve_href(href, base_url))
        .collect()
}

/// The raw reference carried by a link element, if any
pub fn link_target<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    LINK_ATTRIBUTES
        .iter()
        .find_map(|attr| element.value().attr(attr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/fr-ca/").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(html, &base_url())
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let found = links(r#"<html><body><a href="https://other.com/page">x</a></body></html>"#);
        assert_eq!(found, vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_link() {
        let found = links(r#"<a href="produit">x</a>"#);
        assert_eq!(found, vec!["https://example.com/fr-ca/produit"]);
    }

    #[test]
    fn test_extract_from_all_link_elements() {
        let html = r#"
            <html><head><link rel="alternate" href="/en-us/"></head>
            <body>
                <a href="/fr-ca/a">a</a>
                <embed src="/docs/guide.pdf">
                <iframe src="/fr-ca/frame"></iframe>
                <object data="/docs/plan.pdf"></object>
            </body></html>
        "#;
        let found = links(html);
        assert_eq!(
            found,
            vec![
                "https://example.com/en-us/",
                "https://example.com/fr-ca/a",
                "https://example.com/docs/guide.pdf",
                "https://example.com/fr-ca/frame",
                "https://example.com/docs/plan.pdf",
            ]
        );
    }

    #[test]
    fn test_href_preferred_over_src() {
        let found = links(r#"<embed href="/a.pdf" src="/b.pdf">"#);
        assert_eq!(found, vec!["https://example.com/a.pdf"]);
    }

    #[test]
    fn test_ignores_images_and_scripts() {
        let found = links(r#"<img src="/logo.png"><script src="/app.js"></script>"#);
        assert!(found.is_empty());
    }

    #[test]
    fn test_skip_void_and_fragment_links() {
        let html = r##"
            <a href="#">top</a>
            <a href="#section">jump</a>
            <a href="javascript:void(0)">menu</a>
            <a href="javascript:;">menu</a>
            <a href="mailto:info@example.com">mail</a>
            <a href="/fr-ca/ok">ok</a>
        "##;
        assert_eq!(links(html), vec!["https://example.com/fr-ca/ok"]);
    }

    #[test]
    fn test_anchor_without_target() {
        assert!(links(r#"<a name="top">x</a>"#).is_empty());
    }
}
