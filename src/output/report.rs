//! Plain-text run report and summary
//!
//! `crawler_report.txt` records the configuration, counters, visited URLs and
//! generated files of a run; `summary.txt` is the short form.

use crate::output::RunStatistics;
use crate::storage::OutputLayout;
use crate::url::ResourceCategory;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the report needs about one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub start_url: String,
    /// Locale segment label, `none` if the start URL carries none
    pub language: String,
    pub max_depth: u32,
    pub config_hash: Option<String>,
    pub generated_at: DateTime<Local>,
    pub duration: Duration,
    pub stats: RunStatistics,
    /// Visited URLs, sorted
    pub visited: Vec<String>,
    /// Fatal error that ended the run, if any
    pub error: Option<String>,
}

impl RunReport {
    pub fn status(&self) -> &'static str {
        if self.error.is_some() {
            "Completed with errors"
        } else {
            "Completed successfully"
        }
    }
}

/// Writes both the report and the summary into the run directory
///
/// # Returns
///
/// * `Ok(())` - Both files written
/// * `Err(io::Error)` - The first write that failed
pub fn write_reports(report: &RunReport, layout: &OutputLayout) -> io::Result<()> {
    let files: Vec<(&str, Vec<String>)> = layout
        .reported_dirs()
        .into_iter()
        .map(|(label, dir)| (label, list_files(&dir)))
        .collect();

    let report_path = layout.report_file();
    fs::write(&report_path, format_report(report, &files))?;
    tracing::info!("Report generated: {}", report_path.display());

    let summary_path = layout.summary_file();
    fs::write(&summary_path, format_summary(report))?;
    tracing::info!("Summary generated: {}", summary_path.display());

    Ok(())
}

/// Formats the detailed report
///
/// `files` pairs each output directory label with its sorted file names.
pub fn format_report(report: &RunReport, files: &[(&str, Vec<String>)]) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    out.push_str("Crawler Report\n==============\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    out.push_str("Configuration\n-------------\n");
    out.push_str(&format!("Start URL: {}\n", report.start_url));
    out.push_str(&format!("Language Pattern: {}\n", report.language));
    out.push_str(&format!("Max Depth: {}\n", report.max_depth));
    out.push_str(&format!(
        "Config Hash: {}\n",
        report.config_hash.as_deref().unwrap_or("n/a")
    ));
    out.push_str(&format!(
        "Duration: {:.2} seconds\n\n",
        report.duration.as_secs_f64()
    ));

    out.push_str("Statistics\n----------\n");
    out.push_str(&format!("Total URLs found: {}\n", stats.pages_visited));
    out.push_str(&format!("Pages processed: {}\n", stats.pages_processed));
    out.push_str(&format!("Pages failed: {}\n", stats.pages_failed));
    out.push_str(&format!(
        "Pages without content: {}\n",
        stats.pages_without_content
    ));
    out.push_str("Files downloaded:\n");
    out.push_str(&format!(
        "- PDFs: {}\n",
        stats.downloads_for(ResourceCategory::Pdf)
    ));
    out.push_str(&format!(
        "- Images: {}\n",
        stats.downloads_for(ResourceCategory::Image)
    ));
    out.push_str(&format!(
        "- Documents: {}\n",
        stats.downloads_for(ResourceCategory::Doc)
    ));
    out.push_str(&format!(
        "Downloads skipped (already present): {}\n",
        stats.downloads_skipped
    ));
    out.push_str(&format!("Downloads failed: {}\n", stats.downloads_failed));
    out.push_str(&format!(
        "Unclassified resources: {}\n\n",
        stats.downloads_unclassified
    ));

    if let Some(error) = &report.error {
        out.push_str("Errors\n------\n");
        out.push_str(&format!("Critical Error: {}\n\n", error));
    }

    out.push_str("Processed URLs\n--------------\n");
    for url in &report.visited {
        out.push_str(url);
        out.push('\n');
    }

    out.push_str("\nGenerated Files\n---------------\n");
    for (label, names) in files {
        out.push_str(&format!("\n{} Files ({}):\n", label, names.len()));
        for name in names {
            out.push_str(&format!("- {}\n", name));
        }
    }

    out
}

/// Formats the short summary
pub fn format_summary(report: &RunReport) -> String {
    format!(
        "Crawling Summary\n\
         ----------------\n\
         Start URL: {}\n\
         Total URLs: {}\n\
         Pages Processed: {}\n\
         Total Files Downloaded: {}\n\
         Duration: {:.2} seconds\n\
         Status: {}\n",
        report.start_url,
        report.stats.pages_visited,
        report.stats.pages_processed,
        report.stats.total_downloads(),
        report.duration.as_secs_f64(),
        report.status()
    )
}

/// Sorted file names in a directory; missing directories list as empty
fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path: &PathBuf| path.is_file())
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
