//! Run statistics
//!
//! Counters owned by the crawler for the duration of one harvest and
//! rendered into the run report and summary.

use crate::url::ResourceCategory;
use std::collections::HashMap;

/// Counters for one harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Size of the final visited set
    pub pages_visited: u64,

    /// Pages whose content was written to the content directory
    pub pages_processed: u64,

    /// Pages that could not be fetched during extraction
    pub pages_failed: u64,

    /// Pages without a main region or below the minimum content length
    pub pages_without_content: u64,

    /// Files written per category
    pub downloads: HashMap<ResourceCategory, u64>,

    /// Downloads skipped because the destination file already existed
    pub downloads_skipped: u64,

    /// Downloads that failed to fetch or write
    pub downloads_failed: u64,

    /// Resources whose category could not be determined
    pub downloads_unclassified: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the counter of a category after a file is written
    pub fn record_download(&mut self, category: ResourceCategory) {
        *self.downloads.entry(category).or_insert(0) += 1;
    }

    /// Files written in one category
    pub fn downloads_for(&self, category: ResourceCategory) -> u64 {
        self.downloads.get(&category).copied().unwrap_or(0)
    }

    /// Files written across all categories
    pub fn total_downloads(&self) -> u64 {
        self.downloads.values().sum()
    }
}
