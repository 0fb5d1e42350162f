use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure for Site-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
}

impl Config {
    /// Builds a configuration with every default in place for the given start URL
    pub fn for_start_url(start_url: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig {
                start_url: start_url.into(),
                max_depth: default_max_depth(),
                excluded_paths: default_excluded_paths(),
                max_concurrent_requests: default_max_concurrent_requests(),
                min_content_chars: default_min_content_chars(),
            },
            fetch: FetchConfig::default(),
            output: OutputConfig::default(),
            downloads: DownloadsConfig::default(),
        }
    }
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the traversal starts from (depth 0)
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum number of hops from the start URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// URL substrings that prune a page from the traversal
    #[serde(rename = "excluded-paths", default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Maximum number of requests in flight at once
    #[serde(
        rename = "max-concurrent-requests",
        default = "default_max_concurrent_requests"
    )]
    pub max_concurrent_requests: usize,

    /// Minimum non-whitespace characters of extracted text for a page to be saved
    #[serde(rename = "min-content-chars", default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Retries after the first attempt on transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay of the exponential backoff (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Timeout for HEAD existence/metadata checks (seconds)
    #[serde(rename = "head-timeout-secs")]
    pub head_timeout_secs: u64,

    /// Timeout for page GET requests (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Timeout for streamed resource downloads (seconds)
    #[serde(rename = "download-timeout-secs")]
    pub download_timeout_secs: u64,

    /// Skip TLS certificate validation
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; SiteHarvester/0.1)".to_string(),
            max_retries: 5,
            backoff_base_ms: 1000,
            backoff_max_ms: 120_000,
            head_timeout_secs: 10,
            page_timeout_secs: 20,
            download_timeout_secs: 120,
            accept_invalid_certs: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for harvested files
    pub directory: PathBuf,

    /// Create a `crawler_output_<timestamp>` run directory under `directory`
    pub timestamped: bool,

    /// Tracking file of downloaded resource URLs (defaults to `<directory>/logs/downloaded_files.txt`)
    #[serde(rename = "tracking-file")]
    pub tracking_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("crawler_output"),
            timestamped: false,
            tracking_file: None,
        }
    }
}

impl OutputConfig {
    /// Returns the tracking file path, falling back to the default location
    pub fn tracking_path(&self) -> PathBuf {
        self.tracking_file
            .clone()
            .unwrap_or_else(|| self.directory.join("logs").join("downloaded_files.txt"))
    }
}

/// Downloadable resource tables, one per category
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    pub pdf: CategoryConfig,
    pub image: CategoryConfig,
    pub doc: CategoryConfig,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            pdf: CategoryConfig::new(&[".pdf"], &[("application/pdf", ".pdf")]),
            image: CategoryConfig::new(
                &[".png", ".jpg", ".jpeg", ".gif", ".svg"],
                &[
                    ("image/jpeg", ".jpg"),
                    ("image/png", ".png"),
                    ("image/gif", ".gif"),
                    ("image/svg+xml", ".svg"),
                ],
            ),
            doc: CategoryConfig::new(
                &[".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"],
                &[
                    ("application/msword", ".doc"),
                    (
                        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                        ".docx",
                    ),
                    ("application/vnd.ms-excel", ".xls"),
                    (
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                        ".xlsx",
                    ),
                    ("application/vnd.ms-powerpoint", ".ppt"),
                    (
                        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                        ".pptx",
                    ),
                ],
            ),
        }
    }
}

/// Extension allow-list and MIME-type table of one resource category
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// Extensions (with leading dot) that mark a URL as this category
    pub extensions: Vec<String>,

    /// Declared content type → extension used for the saved file
    #[serde(rename = "mime-types", default)]
    pub mime_types: BTreeMap<String, String>,
}

impl CategoryConfig {
    fn new(extensions: &[&str], mime_types: &[(&str, &str)]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            mime_types: mime_types
                .iter()
                .map(|(mime, ext)| (mime.to_string(), ext.to_string()))
                .collect(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_excluded_paths() -> Vec<String> {
    vec!["selecteur-de-produits".to_string()]
}

fn default_max_concurrent_requests() -> usize {
    4
}

fn default_min_content_chars() -> usize {
    20
}
