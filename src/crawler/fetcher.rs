//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building one HTTP client with a consistent identity header
//! - Per-request timeouts (HEAD checks, page GETs, streamed downloads)
//! - Bounded retries with exponential backoff on transient failures
//! - Error classification into per-URL failures
//!
//! TLS certificate validation is disabled by default (`accept-invalid-certs`):
//! target sites may present self-signed or misconfigured certificates. This
//! weakens the trust boundary; anything fetched must be treated as untrusted.

use crate::config::FetchConfig;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Per-URL fetch failures
///
/// None of these abort a harvest; callers log them and move on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {source}")]
    Connect { url: String, source: reqwest::Error },

    #[error("Giving up on {url} after {attempts} attempts (last status {status})")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("HTTP error for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn from_reqwest(url: &Url, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_connect() {
            Self::Connect { url, source }
        } else {
            Self::Request { url, source }
        }
    }
}

/// Retry policy applied around every request
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 429, 500, 502, 503, 504 | Retry with backoff, honoring numeric `Retry-After` |
/// | Timeout / connection error | Retry with backoff |
/// | Any other status | Returned to the caller as-is |
/// | Non-idempotent method | Never retried |
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one
    pub backoff_base: Duration,
    /// Upper bound for a single delay
    pub backoff_max: Duration,
    /// Statuses considered transient
    pub retry_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(120),
            retry_statuses: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            ..Self::default()
        }
    }

    /// True if the method may be retried at all
    pub fn applies_to(&self, method: &Method) -> bool {
        matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status)
    }

    pub fn is_retryable_error(&self, error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(20));
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_max)
    }

    /// Delay requested by a numeric `Retry-After` header, capped
    fn retry_after(&self, headers: &HeaderMap) -> Option<Duration> {
        let seconds: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
        Some(Duration::from_secs(seconds).min(self.backoff_max))
    }
}

/// Request timeouts by request kind
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub head: Duration,
    pub page: Duration,
    pub download: Duration,
}

impl Timeouts {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            head: Duration::from_secs(config.head_timeout_secs),
            page: Duration::from_secs(config.page_timeout_secs),
            download: Duration::from_secs(config.download_timeout_secs),
        }
    }
}

/// HTTP client wrapper enforcing timeouts and the retry policy
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    timeouts: Timeouts,
}

impl Fetcher {
    /// Builds the fetcher from configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use site_harvester::config::FetchConfig;
    /// use site_harvester::crawler::Fetcher;
    ///
    /// let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
    /// ```
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config)?;
        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
            timeouts: Timeouts::from_config(config),
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// HEAD request for existence and metadata checks
    pub async fn head(&self, url: &Url) -> Result<Response, FetchError> {
        self.send(Method::HEAD, url, self.timeouts.head).await
    }

    /// GET request for a page
    pub async fn get_page(&self, url: &Url) -> Result<Response, FetchError> {
        self.send(Method::GET, url, self.timeouts.page).await
    }

    /// GET request whose body is streamed to disk by the caller
    pub async fn get_download(&self, url: &Url) -> Result<Response, FetchError> {
        self.send(Method::GET, url, self.timeouts.download).await
    }

    /// Sends a request, retrying transient failures per the policy
    async fn send(
        &self,
        method: Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<Response, FetchError> {
        let retryable = self.policy.applies_to(&method);
        let mut attempt = 0;

        loop {
            let result = self
                .client
                .request(method.clone(), url.clone())
                .timeout(timeout)
                .send()
                .await;

            let delay = match result {
                Ok(response) if retryable && self.policy.is_retryable_status(response.status()) => {
                    if attempt >= self.policy.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            status: response.status().as_u16(),
                            attempts: attempt + 1,
                        });
                    }
                    tracing::warn!(
                        "{} {} returned {}, retrying ({}/{})",
                        method,
                        url,
                        response.status(),
                        attempt + 1,
                        self.policy.max_retries
                    );
                    self.policy
                        .retry_after(response.headers())
                        .unwrap_or_else(|| self.policy.backoff(attempt))
                }
                Ok(response) => return Ok(response),
                Err(e)
                    if retryable
                        && self.policy.is_retryable_error(&e)
                        && attempt < self.policy.max_retries =>
                {
                    tracing::warn!(
                        "{} {} failed: {}, retrying ({}/{})",
                        method,
                        url,
                        e,
                        attempt + 1,
                        self.policy.max_retries
                    );
                    self.policy.backoff(attempt)
                }
                Err(e) => return Err(FetchError::from_reqwest(url, e)),
            };

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Builds an HTTP client with the configured identity and TLS policy
pub fn build_http_client(config: &FetchConfig) -> Result<Client, FetchError> {
    if config.accept_invalid_certs {
        tracing::warn!("TLS certificate validation is disabled for this harvest");
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.head_timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(FetchError::Client)
}

/// Returns the `Content-Type` header of a response, if any
pub fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// True if a content type denotes an HTML (or untyped) document
pub fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        }
        None => true,
    }
}
