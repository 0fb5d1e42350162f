//! Crawler module for site traversal and harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - HTML link discovery
//! - Resource downloads into category directories
//! - Main-content extraction into text files
//! - Breadth-first traversal and the harvest run boundary

mod downloader;
mod extractor;
mod fetcher;
mod parser;
mod traversal;

pub use downloader::{DownloadOutcome, Downloader, DOWNLOAD_CHUNK_SIZE};
pub use extractor::{
    clean_text, extract_page, ContentExtractor, ExtractedPage, ExtractionStatus, PageExtraction,
};
pub use fetcher::{build_http_client, content_type, is_html, FetchError, Fetcher, RetryPolicy, Timeouts};
pub use parser::{extract_links, links_in};
pub use traversal::{run_harvest, Crawler, Harvester};
