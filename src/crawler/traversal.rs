//! Traversal engine and harvest run boundary
//!
//! The `Crawler` owns every piece of mutable run state (visited set, tracking
//! store, statistics) and drains the frontier one depth level at a time:
//! page fetches for a level run concurrently, then the owner applies their
//! results, enqueues the next level and downloads the resources discovered.
//! The `Harvester` wraps a crawler run so that the tracking file and report
//! are always written, whatever happens inside.

use crate::config::Config;
use crate::crawler::downloader::{DownloadOutcome, Downloader};
use crate::crawler::extractor::{ContentExtractor, ExtractionStatus, PageExtraction};
use crate::crawler::fetcher::{content_type, is_html, Fetcher};
use crate::crawler::parser::extract_links;
use crate::output::{write_reports, RunReport, RunStatistics};
use crate::state::{DropReason, FrontierItem, ItemState, VisitedSet};
use crate::storage::{DownloadTracker, OutputLayout};
use crate::url::{CategoryTable, SiteScope};
use crate::HarvestError;
use chrono::Local;
use futures::{stream, FutureExt, StreamExt};
use reqwest::StatusCode;
use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use url::Url;

/// Result of fetching one frontier page
#[derive(Debug)]
enum PageFetch {
    /// HTML page with its outbound links
    Html { links: Vec<Url> },
    /// Non-HTML response that classifies as a resource
    Resource,
    /// Fetch failure, non-200 status or unusable content
    Failed(String),
}

/// Breadth-first traversal over one site
pub struct Crawler {
    scope: SiteScope,
    fetcher: Fetcher,
    downloader: Downloader,
    extractor: ContentExtractor,
    tracker: DownloadTracker,
    visited: VisitedSet,
    stats: RunStatistics,
    concurrency: usize,
}

impl Crawler {
    /// Creates a crawler for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `layout` - Output directories of this run (must already exist)
    /// * `tracker` - Downloaded set loaded from the tracking file
    pub fn new(
        config: &Config,
        layout: OutputLayout,
        tracker: DownloadTracker,
    ) -> Result<Self, HarvestError> {
        let scope = SiteScope::from_config(config)?;
        let fetcher = Fetcher::new(&config.fetch)?;
        let categories = CategoryTable::from_config(&config.downloads);

        let downloader = Downloader::new(fetcher.clone(), categories.clone(), layout.clone());
        let extractor = ContentExtractor::new(
            fetcher.clone(),
            categories,
            layout,
            config.crawler.min_content_chars,
        );

        Ok(Self {
            scope,
            fetcher,
            downloader,
            extractor,
            tracker,
            visited: VisitedSet::new(),
            stats: RunStatistics::new(),
            concurrency: config.crawler.max_concurrent_requests.max(1),
        })
    }

    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn tracker(&self) -> &DownloadTracker {
        &self.tracker
    }

    /// Current counters, with the visited-set size filled in
    pub fn statistics(&self) -> RunStatistics {
        let mut stats = self.stats.clone();
        stats.pages_visited = self.visited.len() as u64;
        stats
    }

    fn categories(&self) -> &CategoryTable {
        self.downloader.categories()
    }

    /// Decides what happens to a dequeued frontier item
    ///
    /// Returns `Downloading`, `Expanding` or `Dropped`.
    pub fn classify_item(&self, item: &FrontierItem) -> ItemState {
        let state = if item.depth > self.scope.max_depth {
            ItemState::Dropped(DropReason::DepthExceeded)
        } else if self.scope.is_excluded(&item.url) {
            ItemState::Dropped(DropReason::Excluded)
        } else if self.categories().is_downloadable(&item.url) {
            if self.tracker.contains(item.url.as_str()) {
                ItemState::Dropped(DropReason::AlreadyDownloaded)
            } else {
                ItemState::Downloading
            }
        } else {
            ItemState::Expanding
        };

        debug_assert!(ItemState::Classifying.can_transition_to(&state));
        state
    }

    /// Decides what happens to a link discovered on a page at `parent_depth`
    ///
    /// Returns `Queued` for a page to enqueue at `parent_depth + 1`,
    /// `Downloading` for a resource, or `Dropped`.
    pub fn route_link(&self, link: &Url, parent_depth: u32) -> ItemState {
        if self.scope.is_excluded(link) {
            return ItemState::Dropped(DropReason::Excluded);
        }

        if self.categories().is_downloadable(link) {
            return if self.tracker.contains(link.as_str()) {
                ItemState::Dropped(DropReason::AlreadyDownloaded)
            } else {
                ItemState::Downloading
            };
        }

        if !self.scope.is_same_domain(link) {
            ItemState::Dropped(DropReason::ForeignDomain)
        } else if !self.scope.is_same_language(link) {
            ItemState::Dropped(DropReason::ForeignLanguage)
        } else if parent_depth + 1 > self.scope.max_depth {
            ItemState::Dropped(DropReason::DepthExceeded)
        } else if self.visited.contains(link) {
            ItemState::Dropped(DropReason::AlreadyVisited)
        } else {
            ItemState::Queued
        }
    }

    /// Runs the traversal, then content extraction over the visited set
    pub async fn harvest(&mut self) {
        self.traverse().await;
        self.extract_content().await;
    }

    /// Breadth-first traversal from the start URL
    ///
    /// Builds the visited set and downloads every resource reached on the way.
    /// Per-URL failures are logged and never stop the traversal.
    pub async fn traverse(&mut self) {
        let start = FrontierItem::new(self.scope.start_url.clone(), 0);
        tracing::info!(
            "Starting traversal from {} (domain: {}, language: {}, max depth: {})",
            start.url,
            self.scope.domain,
            self.scope.language_label(),
            self.scope.max_depth
        );

        self.visited.insert(&start.url);
        let mut frontier = VecDeque::from([start]);

        while !frontier.is_empty() {
            let level: Vec<FrontierItem> = frontier.drain(..).collect();
            let mut pages = Vec::new();
            let mut resources = Vec::new();

            for item in level {
                match self.classify_item(&item) {
                    ItemState::Expanding => pages.push(item),
                    ItemState::Downloading => resources.push(item.url),
                    ItemState::Dropped(reason) => {
                        tracing::debug!("Dropping {} (depth {}): {}", item.url, item.depth, reason)
                    }
                    ItemState::Queued | ItemState::Classifying => {}
                }
            }

            if let Some(depth) = pages.first().map(|item| item.depth) {
                tracing::info!(
                    "Depth {}: fetching {} pages ({} visited so far)",
                    depth,
                    pages.len(),
                    self.visited.len()
                );
            }

            let fetcher = &self.fetcher;
            let categories = self.downloader.categories();
            let fetched: Vec<(FrontierItem, PageFetch)> = stream::iter(pages)
                .map(move |item| async move {
                    let page = fetch_page(fetcher, categories, &item.url).await;
                    (item, page)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

            for (item, page) in fetched {
                match page {
                    PageFetch::Html { links } => {
                        tracing::debug!("Found {} links on {}", links.len(), item.url);
                        for link in links {
                            match self.route_link(&link, item.depth) {
                                ItemState::Queued => {
                                    if self.visited.insert(&link) {
                                        tracing::debug!("Queued {} (depth {})", link, item.depth + 1);
                                        frontier.push_back(FrontierItem::new(link, item.depth + 1));
                                    }
                                }
                                ItemState::Downloading => resources.push(link),
                                ItemState::Dropped(reason) => {
                                    tracing::trace!("Skipping {}: {}", link, reason)
                                }
                                ItemState::Classifying | ItemState::Expanding => {}
                            }
                        }
                    }
                    PageFetch::Resource => {
                        tracing::info!("{} is a resource, routing to download", item.url);
                        resources.push(item.url);
                    }
                    PageFetch::Failed(reason) => {
                        tracing::warn!(
                            "Error processing {}: {} ({})",
                            item.url,
                            reason,
                            DropReason::FetchFailed
                        );
                    }
                }
            }

            self.download_all(resources).await;
        }

        tracing::info!(
            "Traversal complete: {} pages visited, {} files downloaded",
            self.visited.len(),
            self.stats.total_downloads()
        );
    }

    /// Extracts the content of every visited page
    ///
    /// Downloadable links found in the content regions go through the same
    /// download path as the traversal.
    pub async fn extract_content(&mut self) {
        let urls: Vec<Url> = self.visited.iter().cloned().collect();
        tracing::info!("Extracting content from {} pages", urls.len());

        let extractor = &self.extractor;
        let extractions: Vec<PageExtraction> = stream::iter(urls)
            .map(move |url| async move { extractor.extract(&url).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut resources = Vec::new();
        for extraction in extractions {
            match &extraction.status {
                ExtractionStatus::Saved(_) => self.stats.pages_processed += 1,
                ExtractionStatus::NoSignificantContent | ExtractionStatus::NoMainContent => {
                    self.stats.pages_without_content += 1
                }
                ExtractionStatus::Failed(_) => self.stats.pages_failed += 1,
                ExtractionStatus::Skipped(reason) => {
                    tracing::debug!("Skipped {}: {}", extraction.url, reason)
                }
            }
            resources.extend(
                extraction
                    .resource_links
                    .into_iter()
                    .filter(|link| !self.scope.is_excluded(link)),
            );
        }

        self.download_all(resources).await;

        tracing::info!(
            "Content extraction complete: {} pages processed",
            self.stats.pages_processed
        );
    }

    /// Downloads a batch of resources, skipping duplicates and tracked URLs
    async fn download_all(&mut self, urls: Vec<Url>) {
        let mut seen = HashSet::new();
        let tracker = &self.tracker;
        let batch: Vec<Url> = urls
            .into_iter()
            .filter(|url| !tracker.contains(url.as_str()))
            .filter(|url| seen.insert(url.as_str().to_string()))
            .collect();

        if batch.is_empty() {
            return;
        }

        let downloader = &self.downloader;
        let outcomes: Vec<(Url, DownloadOutcome)> = stream::iter(batch)
            .map(move |url| async move {
                let outcome = downloader.download(&url).await;
                (url, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (url, outcome) in outcomes {
            self.record_download(&url, outcome);
        }
    }

    fn record_download(&mut self, url: &Url, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { category, .. } => {
                self.tracker.record(url.as_str());
                self.stats.record_download(category);
            }
            DownloadOutcome::AlreadyPresent { .. } => {
                self.tracker.record(url.as_str());
                self.stats.downloads_skipped += 1;
            }
            DownloadOutcome::Unclassified => self.stats.downloads_unclassified += 1,
            DownloadOutcome::Failed { .. } => self.stats.downloads_failed += 1,
        }
    }
}

/// Fetches a frontier page and extracts its links
async fn fetch_page(fetcher: &Fetcher, categories: &CategoryTable, url: &Url) -> PageFetch {
    tracing::debug!("Exploring: {}", url);

    let response = match fetcher.get_page(url).await {
        Ok(response) => response,
        Err(e) => return PageFetch::Failed(e.to_string()),
    };

    if response.status() != StatusCode::OK {
        return PageFetch::Failed(format!("status code {}", response.status().as_u16()));
    }

    let declared = content_type(&response);
    if !is_html(declared.as_deref()) {
        return match categories.classify(url, declared.as_deref()) {
            Some(_) => PageFetch::Resource,
            None => PageFetch::Failed(format!(
                "unsupported content type {}",
                declared.unwrap_or_default()
            )),
        };
    }

    let base = response.url().clone();
    match response.text().await {
        Ok(body) => PageFetch::Html {
            links: extract_links(&body, &base),
        },
        Err(e) => PageFetch::Failed(e.to_string()),
    }
}

/// Runs one harvest end to end
///
/// Whatever happens during the crawl, the tracking file is saved and the
/// report and summary are written before `run` returns.
pub struct Harvester {
    config: Config,
    config_hash: Option<String>,
    layout: OutputLayout,
}

impl Harvester {
    /// Creates a harvester; the run directory is resolved now
    pub fn new(config: Config) -> Self {
        let layout = OutputLayout::for_run(&config.output, Local::now());
        Self {
            config,
            config_hash: None,
            layout,
        }
    }

    /// Records the configuration file hash in the report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Runs traversal and extraction, then persists state and reports
    ///
    /// # Returns
    ///
    /// * `Ok(RunStatistics)` - Run completed; per-URL failures are counted, not raised
    /// * `Err(HarvestError)` - Setup failed, the run aborted, or state could not be saved
    pub async fn run(&self) -> Result<RunStatistics, HarvestError> {
        let started = Instant::now();
        tracing::info!(
            "Starting harvest of {} into {}",
            self.config.crawler.start_url,
            self.layout.root().display()
        );

        self.layout.create_dirs()?;
        let tracker = DownloadTracker::load(self.config.output.tracking_path())?;

        let mut crawler = match Crawler::new(&self.config, self.layout.clone(), tracker) {
            Ok(crawler) => crawler,
            Err(e) => {
                tracing::error!("Failed to start harvest: {}", e);
                let report = self.report(RunStatistics::new(), Vec::new(), started, Some(&e));
                if let Err(write_err) = write_reports(&report, &self.layout) {
                    tracing::error!("Failed to write report: {}", write_err);
                }
                return Err(e);
            }
        };

        let outcome = AssertUnwindSafe(crawler.harvest()).catch_unwind().await;
        self.finish(&crawler, outcome, started)
    }

    /// Saves the tracking file and writes the reports after a crawl
    ///
    /// A panic payload in `outcome` becomes `HarvestError::Aborted`; state is
    /// persisted either way.
    fn finish(
        &self,
        crawler: &Crawler,
        outcome: Result<(), Box<dyn Any + Send>>,
        started: Instant,
    ) -> Result<RunStatistics, HarvestError> {
        let mut error = match outcome {
            Ok(()) => None,
            Err(panic) => {
                let e = HarvestError::Aborted(panic_message(panic));
                tracing::error!("{}", e);
                Some(e)
            }
        };

        if let Err(e) = crawler.tracker().save() {
            tracing::error!("Failed to save tracking file: {}", e);
            if error.is_none() {
                error = Some(e.into());
            }
        }

        let stats = crawler.statistics();
        let report = self.report(
            stats.clone(),
            crawler.visited().sorted(),
            started,
            error.as_ref(),
        );
        if let Err(e) = write_reports(&report, &self.layout) {
            tracing::error!("Failed to write report: {}", e);
            if error.is_none() {
                error = Some(e.into());
            }
        }

        tracing::info!(
            "Harvest finished in {:.2}s: {} pages visited, {} processed, {} files downloaded",
            started.elapsed().as_secs_f64(),
            stats.pages_visited,
            stats.pages_processed,
            stats.total_downloads()
        );

        match error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    fn report(
        &self,
        stats: RunStatistics,
        visited: Vec<String>,
        started: Instant,
        error: Option<&HarvestError>,
    ) -> RunReport {
        let language = SiteScope::from_config(&self.config)
            .map(|scope| scope.language_label())
            .unwrap_or_else(|_| "none".to_string());

        RunReport {
            start_url: self.config.crawler.start_url.clone(),
            language,
            max_depth: self.config.crawler.max_depth,
            config_hash: self.config_hash.clone(),
            generated_at: Local::now(),
            duration: started.elapsed(),
            stats,
            visited,
            error: error.map(|e| e.to_string()),
        }
    }
}

/// Runs one harvest with the run directory derived from `config`
pub async fn run_harvest(config: Config) -> Result<RunStatistics, HarvestError> {
    Harvester::new(config).run().await
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
