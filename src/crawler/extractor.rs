//! Content extraction for visited pages
//!
//! Isolates the main content region of a page, converts it to normalized
//! text with a title line and a source line, and reports the downloadable
//! links found inside that region.

use crate::crawler::fetcher::{content_type, is_html, Fetcher};
use crate::crawler::parser::links_in;
use crate::storage::OutputLayout;
use crate::url::{sanitize_filename, CategoryTable};
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use std::fmt::Write as _;
use std::path::PathBuf;
use url::Url;

/// Elements removed before conversion
const STRIPPED_ELEMENTS: &[&str] = &[
    "nav", "header", "footer", "script", "style", "aside", "iframe", "noscript",
];

/// Main content region candidates, in order of preference
const MAIN_SELECTORS: &[&str] = &["main", "article", "div.content", "div#content"];

/// Attributes rewritten to absolute URLs
const URL_ATTRIBUTES: &[&str] = &["href", "src", "data"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Line width handed to the text converter; wide enough that paragraphs never wrap
const TEXT_WIDTH: usize = 10_000;

/// Main content of a parsed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    /// Normalized text of the main region
    pub body: String,
    /// Downloadable resources linked from the main region
    pub resource_links: Vec<Url>,
}

impl ExtractedPage {
    /// Number of non-whitespace characters in the body
    pub fn significant_chars(&self) -> usize {
        self.body.chars().filter(|c| !c.is_whitespace()).count()
    }

    /// Full text artifact: title line, provenance line, body
    pub fn to_document(&self, source: &Url) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(title) = &self.title {
            parts.push(format!("# {}", title));
        }
        parts.push(format!("**Source:** {}", source));
        parts.push(self.body.clone());
        clean_text(&parts.join("\n\n"))
    }
}

/// What happened to one page during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Text written to the content directory
    Saved(PathBuf),
    /// Main region found but its text is below the minimum length
    NoSignificantContent,
    /// No main content region in the page
    NoMainContent,
    /// Not a page (downloadable URL or non-HTML response)
    Skipped(String),
    /// Fetch, status or write failure
    Failed(String),
}

/// Extraction result for one visited page
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub url: Url,
    pub status: ExtractionStatus,
    pub resource_links: Vec<Url>,
}

impl PageExtraction {
    fn new(url: &Url, status: ExtractionStatus) -> Self {
        Self {
            url: url.clone(),
            status,
            resource_links: Vec::new(),
        }
    }
}

/// Fetches visited pages and writes their main content as text
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    fetcher: Fetcher,
    categories: CategoryTable,
    layout: OutputLayout,
    min_content_chars: usize,
}

impl ContentExtractor {
    pub fn new(
        fetcher: Fetcher,
        categories: CategoryTable,
        layout: OutputLayout,
        min_content_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            categories,
            layout,
            min_content_chars,
        }
    }

    /// Extracts one page; never fails the run
    pub async fn extract(&self, url: &Url) -> PageExtraction {
        if self.categories.is_downloadable(url) {
            tracing::debug!("Skipping content extraction for downloadable file: {}", url);
            return PageExtraction::new(
                url,
                ExtractionStatus::Skipped("downloadable resource".to_string()),
            );
        }

        tracing::info!("Extracting content from: {}", url);

        let response = match self.fetcher.get_page(url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", url, e);
                return PageExtraction::new(url, ExtractionStatus::Failed(e.to_string()));
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!("Skipping {}: status code {}", url, response.status());
            return PageExtraction::new(
                url,
                ExtractionStatus::Failed(format!("status code {}", response.status().as_u16())),
            );
        }

        let declared = content_type(&response);
        if !is_html(declared.as_deref()) {
            return PageExtraction::new(
                url,
                ExtractionStatus::Skipped(format!(
                    "non-HTML content ({})",
                    declared.unwrap_or_default()
                )),
            );
        }

        let base = response.url().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Error reading {}: {}", url, e);
                return PageExtraction::new(url, ExtractionStatus::Failed(e.to_string()));
            }
        };

        let page = match extract_page(&body, &base, &self.categories) {
            Some(page) => page,
            None => {
                tracing::warn!("No main content found for: {}", url);
                return PageExtraction::new(url, ExtractionStatus::NoMainContent);
            }
        };

        let resource_links = page.resource_links.clone();

        if page.significant_chars() < self.min_content_chars {
            tracing::warn!("No significant content found for: {}", url);
            return PageExtraction {
                url: url.clone(),
                status: ExtractionStatus::NoSignificantContent,
                resource_links,
            };
        }

        let filename = sanitize_filename(url.as_str(), ".txt", None);
        let path = self.layout.content_dir().join(filename);
        let status = match tokio::fs::write(&path, page.to_document(url)).await {
            Ok(()) => {
                tracing::info!("Saved content to: {}", path.display());
                ExtractionStatus::Saved(path)
            }
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", path.display(), e);
                ExtractionStatus::Failed(e.to_string())
            }
        };

        PageExtraction {
            url: url.clone(),
            status,
            resource_links,
        }
    }
}

/// Isolates and converts the main content of an HTML document
///
/// Returns `None` when no main region exists. `base_url` resolves relative
/// links so the extracted text keeps usable references.
pub fn extract_page(html: &str, base_url: &Url, categories: &CategoryTable) -> Option<ExtractedPage> {
    let document = Html::parse_document(html);
    let region = find_main_region(&document)?;

    let rendered = render_region(region, base_url);
    let text = html2text::from_read(rendered.as_bytes(), TEXT_WIDTH);

    let resource_links = links_in(region, base_url)
        .into_iter()
        .filter(|link| categories.is_downloadable(link))
        .collect();

    Some(ExtractedPage {
        title: find_title(&document),
        body: clean_text(&text),
        resource_links,
    })
}

/// First candidate region that is not inside a stripped element
fn find_main_region(document: &Html) -> Option<ElementRef<'_>> {
    for css in MAIN_SELECTORS {
        let selector = match Selector::parse(css) {
            Ok(selector) => selector,
            Err(_) => continue,
        };
        if let Some(region) = document.select(&selector).find(|el| !is_removed(el)) {
            return Some(region);
        }
    }
    None
}

/// Text of the first visible `<h1>`, whitespace collapsed
fn find_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;
    document
        .select(&selector)
        .find(|el| !is_removed(el))
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

fn is_stripped(element: &ElementRef<'_>) -> bool {
    STRIPPED_ELEMENTS.contains(&element.value().name())
}

/// True if the element or one of its ancestors is stripped
fn is_removed(element: &ElementRef<'_>) -> bool {
    is_stripped(element)
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| is_stripped(&ancestor))
}

/// Serializes a region without stripped elements, with absolute link targets
pub fn render_region(region: ElementRef<'_>, base_url: &Url) -> String {
    let mut out = String::new();
    render_element(region, base_url, &mut out);
    out
}

fn render_element(element: ElementRef<'_>, base_url: &Url, out: &mut String) {
    if is_stripped(&element) {
        return;
    }

    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        let value = if URL_ATTRIBUTES.contains(&attr) {
            base_url
                .join(value.trim())
                .map(|u| u.to_string())
                .unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        };
        let _ = write!(out, " {}=\"{}\"", attr, escape_html(&value, true));
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            render_element(child_element, base_url, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(&escape_html(text, false));
        }
    }

    let _ = write!(out, "</{}>", name);
}

fn escape_html(text: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
}

/// Normalizes extracted text
///
/// Removes control characters, collapses runs of spaces and tabs, trims line
/// ends, keeps at most one blank line between blocks and trims the result.
pub fn clean_text(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for raw in text.split('\n') {
        let mut line = String::with_capacity(raw.len());
        let mut in_space = false;
        for c in raw.chars().filter(|c| !is_control(*c) && *c != '\r') {
            if c == ' ' || c == '\t' {
                if !in_space {
                    line.push(' ');
                }
                in_space = true;
            } else {
                line.push(c);
                in_space = false;
            }
        }
        let line = line.trim_end().to_string();

        if line.trim().is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(line);
            previous_blank = false;
        }
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/fr-ca/produits/").unwrap()
    }

    fn extract(html: &str) -> Option<ExtractedPage> {
        extract_page(html, &base_url(), &CategoryTable::default())
    }

    #[test]
    fn test_prefers_main_element() {
        let html = r#"
            <html><body>
                <div class="content"><p>Contenu secondaire</p></div>
                <main><h1>Produits</h1><p>Bienvenue dans notre catalogue</p></main>
            </body></html>
        "#;
        let page = extract(html).unwrap();
        assert!(page.body.contains("Bienvenue dans notre catalogue"));
        assert!(!page.body.contains("Contenu secondaire"));
        assert_eq!(page.title.as_deref(), Some("Produits"));
    }

    #[test]
    fn test_falls_back_to_content_div() {
        let html = r#"<html><body><div id="content"><p>Texte principal de la page</p></div></body></html>"#;
        let page = extract(html).unwrap();
        assert!(page.body.contains("Texte principal de la page"));
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_no_main_region() {
        let html = r#"<html><body><div><p>Rien ici</p></div></body></html>"#;
        assert!(extract(html).is_none());
    }

    #[test]
    fn test_region_inside_stripped_element_is_ignored() {
        let html = r#"
            <html><body>
                <header><article><p>Bandeau promotionnel</p></article></header>
                <div class="content"><p>Le vrai contenu</p></div>
            </body></html>
        "#;
        let page = extract(html).unwrap();
        assert!(page.body.contains("Le vrai contenu"));
        assert!(!page.body.contains("Bandeau"));
    }

    #[test]
    fn test_strips_navigation_and_scripts_inside_region() {
        let html = r#"
            <main>
                <nav><a href="/menu">Menu principal</a></nav>
                <p>Paragraphe utile</p>
                <script>var tracking = 1;</script>
                <aside>Publicité</aside>
            </main>
        "#;
        let page = extract(html).unwrap();
        assert!(page.body.contains("Paragraphe utile"));
        assert!(!page.body.contains("Menu principal"));
        assert!(!page.body.contains("tracking"));
        assert!(!page.body.contains("Publicité"));
    }

    #[test]
    fn test_title_skips_header_h1() {
        let html = r#"
            <header><h1>Logo</h1></header>
            <main><h1>Fiche technique</h1><p>Détails</p></main>
        "#;
        let page = extract(html).unwrap();
        assert_eq!(page.title.as_deref(), Some("Fiche technique"));
    }

    #[test]
    fn test_render_region_absolutizes_links() {
        let html = r#"<main><a href="../contact">Contact</a><img src="img/a.png"><p>x &amp; y</p></main>"#;
        let document = Html::parse_document(html);
        let region = find_main_region(&document).unwrap();
        let rendered = render_region(region, &base_url());
        assert!(rendered.contains(r#"href="https://example.com/fr-ca/contact""#));
        assert!(rendered.contains(r#"src="https://example.com/fr-ca/produits/img/a.png""#));
        assert!(rendered.contains("x &amp; y"));
        assert!(!rendered.contains("</img>"));
    }

    #[test]
    fn test_resource_links_in_region() {
        let html = r#"
            <nav><a href="/catalogue.pdf">Catalogue</a></nav>
            <main>
                <a href="fiche.pdf">Fiche</a>
                <a href="/fr-ca/autre">Autre page</a>
                <object data="/plans/plan.docx"></object>
            </main>
        "#;
        let page = extract(html).unwrap();
        let links: Vec<&str> = page.resource_links.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/fr-ca/produits/fiche.pdf",
                "https://example.com/plans/plan.docx",
            ]
        );
    }

    #[test]
    fn test_to_document_has_title_and_source() {
        let page = ExtractedPage {
            title: Some("Produits".to_string()),
            body: "Texte".to_string(),
            resource_links: vec![],
        };
        let doc = page.to_document(&base_url());
        assert_eq!(
            doc,
            "# Produits\n\n**Source:** https://example.com/fr-ca/produits/\n\nTexte"
        );
    }

    #[test]
    fn test_significant_chars_ignores_whitespace() {
        let page = ExtractedPage {
            title: None,
            body: " a b\n\n c ".to_string(),
            resource_links: vec![],
        };
        assert_eq!(page.significant_chars(), 3);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a \t\t b  \n\n\n\nc\u{7}d\n"), "a b\n\ncd");
        assert_eq!(clean_text("\n\n  \n"), "");
        assert_eq!(clean_text("line1\r\nline2"), "line1\nline2");
    }
}
