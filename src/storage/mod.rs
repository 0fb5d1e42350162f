//! Storage module for persisting harvest data
//!
//! This module handles everything that touches the local filesystem:
//! - The cross-run tracking file of downloaded resource URLs
//! - The run-scoped output directory layout (`content/`, `PDF/`, `Image/`, `Doc/`, `logs/`)

mod layout;
mod tracking;

pub use layout::OutputLayout;
pub use tracking::DownloadTracker;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read tracking file {path}: {source}")]
    TrackingRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write tracking file {path}: {source}")]
    TrackingWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
