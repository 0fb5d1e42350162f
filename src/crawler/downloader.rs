//! Resource download path
//!
//! Resolves a downloadable URL's category (HEAD, falling back to GET), picks
//! its destination under the run directory, and streams the body to disk.
//! The downloader never touches the tracking store: the traversal owner
//! checks it before calling `download` and records the URL only after a
//! `Downloaded` or `AlreadyPresent` outcome.

use crate::crawler::fetcher::{content_type, FetchError, Fetcher};
use crate::storage::OutputLayout;
use crate::url::{sanitize_filename, CategoryTable, ResourceCategory};
use reqwest::{Response, StatusCode};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

/// Write buffer size for streamed downloads
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

/// Result of one download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Body fully written to `path`
    Downloaded {
        category: ResourceCategory,
        path: PathBuf,
        bytes: u64,
    },
    /// Destination file already exists; nothing fetched
    AlreadyPresent {
        category: ResourceCategory,
        path: PathBuf,
    },
    /// Neither the URL nor the content type resolved to a category
    Unclassified,
    /// Fetch or write failed; no file left behind
    Failed { reason: String },
}

#[derive(Debug, Error)]
enum StreamError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("body stream failed: {0}")]
    Body(#[from] reqwest::Error),
}

/// Downloads resources into their category directory
#[derive(Debug, Clone)]
pub struct Downloader {
    fetcher: Fetcher,
    categories: CategoryTable,
    layout: OutputLayout,
}

impl Downloader {
    pub fn new(fetcher: Fetcher, categories: CategoryTable, layout: OutputLayout) -> Self {
        Self {
            fetcher,
            categories,
            layout,
        }
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Downloads one resource URL
    ///
    /// # Flow
    ///
    /// 1. HEAD the URL; on failure or a non-success status, GET it instead
    ///    and keep that response for streaming
    /// 2. Classify from the URL path and declared content type
    /// 3. Skip if `<Category>/<sanitized name>` already exists
    /// 4. Stream the body through an 8 KiB buffer into `<name>.part`, then rename
    pub async fn download(&self, url: &Url) -> DownloadOutcome {
        tracing::info!("Attempting to download resource: {}", url);

        let (declared_type, mut prefetched) = match self.fetcher.head(url).await {
            Ok(response) if response.status().is_success() => (content_type(&response), None),
            head_result => {
                match &head_result {
                    Ok(response) => tracing::debug!(
                        "HEAD {} returned {}, probing with GET",
                        url,
                        response.status()
                    ),
                    Err(e) => tracing::debug!("HEAD {} failed ({}), probing with GET", url, e),
                }
                match self.open_stream(url).await {
                    Ok(response) => (content_type(&response), Some(response)),
                    Err(reason) => {
                        tracing::warn!("Failed to download {}: {}", url, reason);
                        return DownloadOutcome::Failed { reason };
                    }
                }
            }
        };

        let (category, extension) = match self.categories.classify(url, declared_type.as_deref())
        {
            Some(resolved) => resolved,
            None => {
                tracing::warn!(
                    "Could not determine the file type for {} (content type: {})",
                    url,
                    declared_type.as_deref().unwrap_or("none")
                );
                return DownloadOutcome::Unclassified;
            }
        };

        let filename = sanitize_filename(url.as_str(), &extension, None);
        let path = self.layout.category_dir(category).join(&filename);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!("File already downloaded, skipping: {}", path.display());
            return DownloadOutcome::AlreadyPresent { category, path };
        }

        let response = match prefetched.take() {
            Some(response) => response,
            None => match self.open_stream(url).await {
                Ok(response) => response,
                Err(reason) => {
                    tracing::warn!("Failed to download {}: {}", url, reason);
                    return DownloadOutcome::Failed { reason };
                }
            },
        };

        match stream_to_file(response, &path).await {
            Ok(bytes) => {
                tracing::info!(
                    "Downloaded {} ({} bytes): {}",
                    category,
                    bytes,
                    path.display()
                );
                DownloadOutcome::Downloaded {
                    category,
                    path,
                    bytes,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to save {}: {}", url, e);
                DownloadOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Streamed GET that must answer 200
    async fn open_stream(&self, url: &Url) -> Result<Response, String> {
        let response = self
            .fetcher
            .get_download(url)
            .await
            .map_err(|e: FetchError| e.to_string())?;

        if response.status() != StatusCode::OK {
            return Err(format!("status code {}", response.status().as_u16()));
        }
        Ok(response)
    }
}

/// Writes a response body to `path` via a `.part` file; returns bytes written
async fn stream_to_file(mut response: Response, path: &Path) -> Result<u64, StreamError> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let result = async {
        let file = tokio::fs::File::create(&part).await?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        tokio::fs::rename(&part, path).await?;
        Ok::<u64, StreamError>(written)
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&part).await;
    }
    result
}
