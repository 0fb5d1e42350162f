use crate::config::Config;
use crate::url::{extract_authority, parse_http_url};
use crate::UrlError;
use std::fmt;
use url::Url;

/// Language codes recognized in a locale path segment
const LANGUAGE_CODES: &[&str] = &["fr", "en"];

/// Region codes recognized in a locale path segment
const REGION_CODES: &[&str] = &["ca", "us"];

/// A locale path segment such as `/fr-ca/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePattern {
    pub language_code: String,
    pub region_code: String,
}

impl LanguagePattern {
    /// Finds the first `/<lang>-<region>/` segment in a URL
    ///
    /// # Examples
    ///
    /// ```
    /// use site_harvester::url::LanguagePattern;
    ///
    /// let pattern = LanguagePattern::detect("https://example.com/fr-ca/produits").unwrap();
    /// assert_eq!(pattern.to_string(), "/fr-ca/");
    /// assert!(LanguagePattern::detect("https://example.com/de-de/").is_none());
    /// ```
    pub fn detect(url: &str) -> Option<Self> {
        let mut best: Option<(usize, Self)> = None;

        for language in LANGUAGE_CODES {
            for region in REGION_CODES {
                let needle = format!("/{}-{}/", language, region);
                if let Some(pos) = url.find(&needle) {
                    if best.as_ref().map_or(true, |(p, _)| pos < *p) {
                        best = Some((
                            pos,
                            Self {
                                language_code: language.to_string(),
                                region_code: region.to_string(),
                            },
                        ));
                    }
                }
            }
        }

        best.map(|(_, pattern)| pattern)
    }
}

impl fmt::Display for LanguagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}-{}/", self.language_code, self.region_code)
    }
}

/// Immutable traversal scope derived once from the start URL
#[derive(Debug, Clone)]
pub struct SiteScope {
    pub start_url: Url,
    /// Authority of the start URL (host plus explicit port)
    pub domain: String,
    pub language: Option<LanguagePattern>,
    pub max_depth: u32,
    pub excluded_paths: Vec<String>,
    language_segment: Option<String>,
}

impl SiteScope {
    /// Builds a scope from a start URL
    pub fn new(
        start_url: &str,
        max_depth: u32,
        excluded_paths: Vec<String>,
    ) -> Result<Self, UrlError> {
        let start_url = parse_http_url(start_url)?;
        let domain = extract_authority(&start_url).ok_or(UrlError::MissingDomain)?;
        let language = LanguagePattern::detect(start_url.as_str());
        let language_segment = language.as_ref().map(|l| l.to_string());

        Ok(Self {
            start_url,
            domain,
            language,
            max_depth,
            excluded_paths,
            language_segment,
        })
    }

    /// Builds a scope from the crawler section of a configuration
    pub fn from_config(config: &Config) -> Result<Self, UrlError> {
        Self::new(
            &config.crawler.start_url,
            config.crawler.max_depth,
            config.crawler.excluded_paths.clone(),
        )
    }

    /// True if any excluded path segment occurs in the URL
    pub fn is_excluded(&self, url: &Url) -> bool {
        let url = url.as_str();
        self.excluded_paths.iter().any(|segment| url.contains(segment))
    }

    /// True if the URL carries the start URL's locale segment, or no locale is in force
    pub fn is_same_language(&self, url: &Url) -> bool {
        match &self.language_segment {
            Some(segment) => url.as_str().contains(segment.as_str()),
            None => true,
        }
    }

    /// True if the URL's authority is the start authority or one of its subdomains
    pub fn is_same_domain(&self, url: &Url) -> bool {
        extract_authority(url)
            .map(|authority| {
                authority == self.domain
                    || authority
                        .strip_suffix(self.domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .unwrap_or(false)
    }

    /// The configured locale segment, for reporting
    pub fn language_label(&self) -> String {
        self.language_segment
            .clone()
            .unwrap_or_else(|| "none".to_string())
    }
}
