use crate::config::OutputConfig;
use crate::storage::{StorageError, StorageResult};
use crate::url::ResourceCategory;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory layout of one harvest run
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Uses `root` as the run directory as-is
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the run directory from the output configuration
    ///
    /// With `timestamped` set, each run gets its own
    /// `crawler_output_<YYYYmmdd_HHMMSS>` directory under the configured root.
    pub fn for_run(config: &OutputConfig, started_at: DateTime<Local>) -> Self {
        if config.timestamped {
            let name = format!("crawler_output_{}", started_at.format("%Y%m%d_%H%M%S"));
            Self::new(config.directory.join(name))
        } else {
            Self::new(config.directory.clone())
        }
    }

    /// Creates the run directory and every subdirectory
    pub fn create_dirs(&self) -> StorageResult<()> {
        let mut dirs = vec![self.content_dir(), self.logs_dir()];
        dirs.extend(ResourceCategory::ALL.iter().map(|c| self.category_dir(*c)));

        for dir in dirs {
            fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join("content")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn category_dir(&self, category: ResourceCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("crawler.log")
    }

    pub fn report_file(&self) -> PathBuf {
        self.root.join("crawler_report.txt")
    }

    pub fn summary_file(&self) -> PathBuf {
        self.root.join("summary.txt")
    }

    /// Output directories listed in the run report, with their labels
    pub fn reported_dirs(&self) -> Vec<(&'static str, PathBuf)> {
        let mut dirs = vec![("content", self.content_dir())];
        dirs.extend(
            ResourceCategory::ALL
                .iter()
                .map(|c| (c.dir_name(), self.category_dir(*c))),
        );
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_create_dirs() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path().join("run"));
        layout.create_dirs().unwrap();

        for sub in ["content", "PDF", "Image", "Doc", "logs"] {
            assert!(layout.root().join(sub).is_dir(), "missing {}", sub);
        }
    }

    #[test]
    fn test_timestamped_run_dir() {
        let config = OutputConfig {
            directory: PathBuf::from("out"),
            timestamped: true,
            tracking_file: None,
        };
        let started = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let layout = OutputLayout::for_run(&config, started);
        assert_eq!(
            layout.root(),
            Path::new("out/crawler_output_20240305_140709")
        );
    }

    #[test]
    fn test_plain_run_dir() {
        let config = OutputConfig::default();
        let layout = OutputLayout::for_run(&config, Local::now());
        assert_eq!(layout.root(), Path::new("crawler_output"));
        assert_eq!(
            layout.category_dir(ResourceCategory::Pdf),
            Path::new("crawler_output/PDF")
        );
    }
}
