//! Persistent set of downloaded resource URLs
//!
//! The tracking file is plain text, one URL per line, written sorted so that
//! successive runs produce stable diffs.

use crate::storage::{StorageError, StorageResult};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Cross-run record of resource URLs confirmed written to disk
#[derive(Debug, Clone)]
pub struct DownloadTracker {
    path: PathBuf,
    urls: BTreeSet<String>,
}

impl DownloadTracker {
    /// Loads the tracking file at `path`
    ///
    /// A missing file is not an error: it means no prior state.
    /// Blank lines and surrounding whitespace are ignored.
    pub fn load(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        let urls = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No tracking file at {}, starting with no prior downloads",
                    path.display()
                );
                BTreeSet::new()
            }
            Err(source) => return Err(StorageError::TrackingRead { path, source }),
        };

        if !urls.is_empty() {
            tracing::info!(
                "Loaded {} previously downloaded URLs from {}",
                urls.len(),
                path.display()
            );
        }

        Ok(Self { path, urls })
    }

    /// True if the URL has already been downloaded
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Records a downloaded URL; returns false if it was already recorded
    pub fn record(&mut self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded URLs in sorted order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Writes the set back out, sorted, one URL per line
    ///
    /// The file is written next to its destination and renamed into place, so
    /// an interrupted save never leaves a truncated tracking file behind.
    pub fn save(&self) -> StorageResult<()> {
        let write_err = |source| StorageError::TrackingWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let file = fs::File::create(&tmp_path).map_err(write_err)?;
            let mut writer = BufWriter::new(file);
            for url in &self.urls {
                writeln!(writer, "{}", url).map_err(write_err)?;
            }
            writer.flush().map_err(write_err)?;
        }
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        tracing::info!(
            "Saved {} downloaded URLs to {}",
            self.urls.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let tracker = DownloadTracker::load(dir.path().join("missing.txt")).unwrap();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_record_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut tracker = DownloadTracker::load(dir.path().join("t.txt")).unwrap();
        assert!(tracker.record("https://example.com/a.pdf"));
        assert!(!tracker.record("https://example.com/a.pdf"));
        assert_eq!(tracker.len(), 1);
        assert!(tracker.contains("https://example.com/a.pdf"));
    }

    #[test]
    fn test_save_is_sorted_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("downloaded_files.txt");

        let mut tracker = DownloadTracker::load(&path).unwrap();
        tracker.record("https://example.com/z.pdf");
        tracker.record("https://example.com/a.png");
        tracker.record("https://example.com/m.docx");
        tracker.save().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "https://example.com/a.png\nhttps://example.com/m.docx\nhttps://example.com/z.pdf\n"
        );

        let reloaded = DownloadTracker::load(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert!(reloaded.contains("https://example.com/m.docx"));
    }

    #[test]
    fn test_load_ignores_blank_lines_and_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "https://example.com/a.pdf  \n\n  \nhttps://example.com/b.pdf\n").unwrap();

        let tracker = DownloadTracker::load(&path).unwrap();
        let urls: Vec<&str> = tracker.urls().collect();
        assert_eq!(
            urls,
            vec!["https://example.com/a.pdf", "https://example.com/b.pdf"]
        );
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.txt");
        let mut tracker = DownloadTracker::load(&path).unwrap();
        tracker.record("https://example.com/a.pdf");
        tracker.save().unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("t.tmp").exists());
    }
}
