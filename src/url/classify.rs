use crate::config::{CategoryConfig, DownloadsConfig};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Categories of downloadable resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    Pdf,
    Image,
    Doc,
}

impl ResourceCategory {
    /// All categories, in classification priority order
    pub const ALL: [ResourceCategory; 3] = [Self::Pdf, Self::Image, Self::Doc];

    /// Name of the output subdirectory holding this category's files
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "Image",
            Self::Doc => "Doc",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Extension allow-list and MIME table of a single category
#[derive(Debug, Clone)]
struct CategoryEntry {
    category: ResourceCategory,
    extensions: Vec<String>,
    mime_types: BTreeMap<String, String>,
}

impl CategoryEntry {
    fn new(category: ResourceCategory, config: &CategoryConfig) -> Self {
        Self {
            category,
            extensions: config
                .extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
            mime_types: config
                .mime_types
                .iter()
                .map(|(mime, ext)| (mime.to_ascii_lowercase(), ext.clone()))
                .collect(),
        }
    }
}

/// Lookup tables deciding whether a URL is a downloadable resource and what it is
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Vec<CategoryEntry>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::from_config(&DownloadsConfig::default())
    }
}

impl CategoryTable {
    /// Builds the tables from the downloads section of a configuration
    pub fn from_config(config: &DownloadsConfig) -> Self {
        Self {
            entries: vec![
                CategoryEntry::new(ResourceCategory::Pdf, &config.pdf),
                CategoryEntry::new(ResourceCategory::Image, &config.image),
                CategoryEntry::new(ResourceCategory::Doc, &config.doc),
            ],
        }
    }

    /// True if the URL path ends with any known extension
    ///
    /// The extension may be followed by one versioning suffix (`.pdf.aspx`).
    /// Matching is case-insensitive and ignores the query string.
    pub fn is_downloadable(&self, url: &Url) -> bool {
        self.category_for_path(url).is_some()
    }

    /// Resolves the category and saved-file extension of a resource
    ///
    /// The URL path decides first; the declared content type then picks the
    /// extension from that category's MIME table, defaulting to the matched
    /// extension. If the path is inconclusive, the content type alone is
    /// looked up across all categories.
    pub fn classify(
        &self,
        url: &Url,
        content_type: Option<&str>,
    ) -> Option<(ResourceCategory, String)> {
        let mime = content_type.map(normalize_mime);

        if let Some((entry, ext)) = self.category_for_path(url) {
            let extension = mime
                .as_deref()
                .and_then(|m| entry.mime_types.get(m))
                .cloned()
                .unwrap_or_else(|| ext.to_string());
            return Some((entry.category, extension));
        }

        mime.as_deref().and_then(|m| self.category_for_mime(m))
    }

    /// Looks a content type up across every category's MIME table
    pub fn category_for_mime(&self, content_type: &str) -> Option<(ResourceCategory, String)> {
        let mime = normalize_mime(content_type);
        self.entries.iter().find_map(|entry| {
            entry
                .mime_types
                .get(&mime)
                .map(|ext| (entry.category, ext.clone()))
        })
    }

    fn category_for_path(&self, url: &Url) -> Option<(&CategoryEntry, &str)> {
        let path = url.path().to_ascii_lowercase();
        self.entries.iter().find_map(|entry| {
            entry
                .extensions
                .iter()
                .find(|ext| path_has_extension(&path, ext))
                .map(|ext| (entry, ext.as_str()))
        })
    }
}

/// Matches `<ext>` or `<ext>.<suffix>` at the end of a lowercased path
fn path_has_extension(path: &str, ext: &str) -> bool {
    if path.ends_with(ext) {
        return true;
    }

    match path.rsplit_once('.') {
        Some((head, suffix)) => {
            !suffix.is_empty()
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                && head.ends_with(ext)
        }
        None => false,
    }
}

/// Strips parameters (`; charset=...`) and lowercases a content type
fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn table() -> CategoryTable {
        CategoryTable::default()
    }

    #[test]
    fn test_downloadable_plain_extensions() {
        let table = table();
        assert!(table.is_downloadable(&url("https://x.com/doc.pdf")));
        assert!(table.is_downloadable(&url("https://x.com/a/photo.jpeg")));
        assert!(table.is_downloadable(&url("https://x.com/sheet.xlsx")));
        assert!(table.is_downloadable(&url("https://x.com/logo.svg")));
    }

    #[test]
    fn test_downloadable_uppercase_extension() {
        assert!(table().is_downloadable(&url("https://x.com/DOC.PDF")));
    }

    #[test]
    fn test_downloadable_ignores_query_string() {
        assert!(table().is_downloadable(&url("https://x.com/doc.pdf?v=2")));
        assert!(!table().is_downloadable(&url("https://x.com/page?file=doc.pdf")));
    }

    #[test]
    fn test_downloadable_versioning_suffix() {
        assert!(table().is_downloadable(&url("https://x.com/fiche.pdf.aspx")));
        assert!(table().is_downloadable(&url("https://x.com/plan.docx.ashx")));
    }

    #[test]
    fn test_not_downloadable() {
        let table = table();
        assert!(!table.is_downloadable(&url("https://x.com/page.html")));
        assert!(!table.is_downloadable(&url("https://x.com/fr-ca/produits/")));
        assert!(!table.is_downloadable(&url("https://x.com/img")));
        assert!(!table.is_downloadable(&url("https://x.com/pdf")));
        assert!(!table.is_downloadable(&url("https://x.com/file.ashx")));
    }

    #[test]
    fn test_classify_pdf_with_query_and_uppercase() {
        assert_eq!(
            table().classify(&url("https://x/doc.PDF?v=2"), None),
            Some((ResourceCategory::Pdf, ".pdf".to_string()))
        );
    }

    #[test]
    fn test_classify_extensionless_by_content_type() {
        assert_eq!(
            table().classify(&url("https://x/img"), Some("image/png")),
            Some((ResourceCategory::Image, ".png".to_string()))
        );
    }

    #[test]
    fn test_classify_html_page_is_none() {
        assert_eq!(table().classify(&url("https://x/page.html"), None), None);
        assert_eq!(
            table().classify(&url("https://x/page.html"), Some("text/html")),
            None
        );
    }

    #[test]
    fn test_classify_handler_path_with_pdf_content_type() {
        assert_eq!(
            table().classify(
                &url("https://x/download.ashx?id=42"),
                Some("application/pdf")
            ),
            Some((ResourceCategory::Pdf, ".pdf".to_string()))
        );
    }

    #[test]
    fn test_classify_content_type_refines_extension() {
        // .jpeg path served as image/jpeg is saved as .jpg
        assert_eq!(
            table().classify(&url("https://x/photo.jpeg"), Some("image/jpeg")),
            Some((ResourceCategory::Image, ".jpg".to_string()))
        );
    }

    #[test]
    fn test_classify_path_wins_over_mismatched_content_type() {
        assert_eq!(
            table().classify(&url("https://x/report.pdf"), Some("image/png")),
            Some((ResourceCategory::Pdf, ".pdf".to_string()))
        );
    }

    #[test]
    fn test_classify_versioned_suffix_keeps_real_extension() {
        assert_eq!(
            table().classify(&url("https://x/fiche.pdf.aspx"), Some("text/html")),
            Some((ResourceCategory::Pdf, ".pdf".to_string()))
        );
    }

    #[test]
    fn test_classify_content_type_with_parameters() {
        assert_eq!(
            table().classify(&url("https://x/get"), Some("Application/PDF; charset=binary")),
            Some((ResourceCategory::Pdf, ".pdf".to_string()))
        );
    }

    #[test]
    fn test_classify_office_mime() {
        assert_eq!(
            table().classify(
                &url("https://x/export"),
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            ),
            Some((ResourceCategory::Doc, ".xlsx".to_string()))
        );
    }

    #[test]
    fn test_category_dir_names() {
        assert_eq!(ResourceCategory::Pdf.dir_name(), "PDF");
        assert_eq!(ResourceCategory::Image.dir_name(), "Image");
        assert_eq!(ResourceCategory::Doc.to_string(), "Doc");
    }
}
