//! Output module for run statistics and reports
//!
//! This module handles:
//! - Counting pages and downloads over one harvest
//! - Writing `crawler_report.txt` and `summary.txt` into the run directory

pub mod report;
pub mod stats;

pub use report::{format_report, format_summary, write_reports, RunReport};
pub use stats::RunStatistics;
