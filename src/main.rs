//! Site-Harvester main entry point
//!
//! This is the command-line interface for the Site-Harvester website ingester.

use anyhow::{bail, Context};
use clap::Parser;
use site_harvester::config::{load_config_with_hash, validate, Config};
use site_harvester::crawler::Harvester;
use site_harvester::url::{CategoryTable, SiteScope};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Site-Harvester: turns a website into a local knowledge-base corpus
///
/// Site-Harvester crawls a site breadth-first within the start URL's domain
/// and language, downloads linked PDFs, images and office documents once
/// across runs, and extracts the main text of every visited page.
#[derive(Parser, Debug)]
#[command(name = "site-harvester")]
#[command(version)]
#[command(about = "Harvests a website into text and document files", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Start URL (overrides the configuration file)
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Maximum traversal depth (overrides the configuration file)
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Output directory (overrides the configuration file)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the harvest scope without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = build_config(&cli)?;

    if cli.dry_run {
        setup_logging(cli.verbose, cli.quiet, None)?;
        return handle_dry_run(&config, config_hash.as_deref());
    }

    let mut harvester = Harvester::new(config);
    if let Some(hash) = &config_hash {
        harvester = harvester.with_config_hash(hash.clone());
    }

    harvester
        .layout()
        .create_dirs()
        .context("Failed to create output directories")?;
    setup_logging(cli.verbose, cli.quiet, Some(&harvester.layout().log_file()))?;

    if let Some(hash) = &config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    match harvester.run().await {
        Ok(stats) => {
            tracing::info!(
                "Harvest completed successfully: {} pages, {} files downloaded",
                stats.pages_visited,
                stats.total_downloads()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

/// Loads the configuration file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match (&cli.config, &cli.start_url) {
        (Some(path), _) => {
            let (config, hash) = load_config_with_hash(path).with_context(|| {
                format!("Failed to load configuration from {}", path.display())
            })?;
            (config, Some(hash))
        }
        (None, Some(start_url)) => (Config::for_start_url(start_url.clone()), None),
        (None, None) => bail!("either a CONFIG file or --start-url is required"),
    };

    if let Some(start_url) = &cli.start_url {
        config.crawler.start_url = start_url.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output.directory = output_dir.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok((config, hash))
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With a log file, every event is also written there without ANSI colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvester=info,warn"),
            1 => EnvFilter::new("site_harvester=debug,info"),
            2 => EnvFilter::new("site_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: validates config and shows the harvest scope
fn handle_dry_run(config: &Config, config_hash: Option<&str>) -> anyhow::Result<()> {
    let scope = SiteScope::from_config(config).context("Invalid start URL")?;
    let categories = CategoryTable::from_config(&config.downloads);

    println!("=== Site-Harvester Dry Run ===\n");

    println!("Scope:");
    println!("  Start URL: {}", scope.start_url);
    println!("  Domain: {}", scope.domain);
    println!("  Language pattern: {}", scope.language_label());
    println!("  Max depth: {}", scope.max_depth);
    println!("  Excluded paths: {}", scope.excluded_paths.join(", "));
    println!(
        "  Start URL is a downloadable resource: {}",
        categories.is_downloadable(&scope.start_url)
    );

    println!("\nFetching:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Max retries: {}", config.fetch.max_retries);
    println!(
        "  Timeouts: HEAD {}s, page {}s, download {}s",
        config.fetch.head_timeout_secs,
        config.fetch.page_timeout_secs,
        config.fetch.download_timeout_secs
    );
    println!(
        "  Accept invalid certificates: {}",
        config.fetch.accept_invalid_certs
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Timestamped runs: {}", config.output.timestamped);
    println!(
        "  Tracking file: {}",
        config.output.tracking_path().display()
    );

    println!("\nDownloads:");
    println!("  PDF: {}", config.downloads.pdf.extensions.join(" "));
    println!("  Image: {}", config.downloads.image.extensions.join(" "));
    println!("  Doc: {}", config.downloads.doc.extensions.join(" "));

    if let Some(hash) = config_hash {
        println!("\nConfig hash: {}", hash);
    }

    println!("\n✓ Configuration is valid");
    tracing::debug!("Dry run complete, nothing fetched");

    Ok(())
}
