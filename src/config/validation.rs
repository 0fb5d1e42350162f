use crate::config::types::{CategoryConfig, Config, CrawlerConfig, FetchConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    validate_category("pdf", &config.downloads.pdf)?;
    validate_category("image", &config.downloads.image)?;
    validate_category("doc", &config.downloads.doc)?;
    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start-url '{}': {}", config.start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start-url '{}' must use HTTP or HTTPS",
            config.start_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "start-url '{}' has no host",
            config.start_url
        )));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 64, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.excluded_paths.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(
            "excluded-paths cannot contain an empty entry".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.backoff_max_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff-max-ms ({}) must be >= backoff-base-ms ({})",
            config.backoff_max_ms, config.backoff_base_ms
        )));
    }

    if config.head_timeout_secs == 0 || config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request timeouts must be greater than zero".to_string(),
        ));
    }

    if config.download_timeout_secs < config.page_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "download-timeout-secs ({}) must be >= page-timeout-secs ({})",
            config.download_timeout_secs, config.page_timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates one resource category table
fn validate_category(name: &str, category: &CategoryConfig) -> Result<(), ConfigError> {
    if category.extensions.is_empty() {
        return Err(ConfigError::Validation(format!(
            "downloads.{} must list at least one extension",
            name
        )));
    }

    for ext in category.extensions.iter().chain(category.mime_types.values()) {
        validate_extension(name, ext)?;
    }

    Ok(())
}

/// An extension is a dot followed by lowercase alphanumerics
fn validate_extension(category: &str, ext: &str) -> Result<(), ConfigError> {
    let valid = ext
        .strip_prefix('.')
        .map(|rest| {
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
        .unwrap_or(false);

    if !valid {
        return Err(ConfigError::Validation(format!(
            "downloads.{}: invalid extension '{}' (expected e.g. '.pdf')",
            category, ext
        )));
    }

    Ok(())
}
