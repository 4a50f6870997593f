use crate::config::types::{CaptureConfig, Config, CrawlerConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Hard ceiling on `max-pages`; the crawl is intentionally small
const MAX_PAGES_CEILING: usize = 50;

/// Longest retrieval link lifetime accepted (one week)
const MAX_LINK_EXPIRY_SECS: u64 = 604_800;

/// Sample signing keys that must never reach production
const PLACEHOLDER_SIGNING_KEYS: &[&str] = &["change-me", "changeme", "secret"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_capture_config(&config.capture)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > MAX_PAGES_CEILING {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_CEILING, config.max_pages
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 120, got {}",
            config.request_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates capture configuration
fn validate_capture_config(config: &CaptureConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("navigation_timeout_secs", config.navigation_timeout_secs),
        ("selector_timeout_secs", config.selector_timeout_secs),
        ("settle_timeout_secs", config.settle_timeout_secs),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if config.scroll_pause_ms > 10_000 {
        return Err(ConfigError::Validation(format!(
            "scroll_pause_ms must be <= 10000ms, got {}ms",
            config.scroll_pause_ms
        )));
    }

    if config.wait_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "wait_selector cannot be empty".to_string(),
        ));
    }

    if config.window_width < 100 || config.window_height < 100 {
        return Err(ConfigError::Validation(format!(
            "window size must be at least 100x100, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    Ok(())
}

/// Validates object storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    validate_bucket_name(&config.bucket)?;

    if config.root_dir.is_empty() {
        return Err(ConfigError::Validation(
            "root_dir cannot be empty".to_string(),
        ));
    }

    let base = Url::parse(&config.public_base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid public_base_url: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "public_base_url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if config.link_expiry_secs < 1 || config.link_expiry_secs > MAX_LINK_EXPIRY_SECS {
        return Err(ConfigError::Validation(format!(
            "link_expiry_secs must be between 1 and {}, got {}",
            MAX_LINK_EXPIRY_SECS, config.link_expiry_secs
        )));
    }

    if config.signing_key.is_empty() {
        return Err(ConfigError::Validation(
            "signing_key cannot be empty".to_string(),
        ));
    }

    if PLACEHOLDER_SIGNING_KEYS.contains(&config.signing_key.trim()) {
        return Err(ConfigError::Validation(format!(
            "signing_key '{}' is a placeholder; set a private secret or leave it unset",
            config.signing_key
        )));
    }

    Ok(())
}

/// Validates a bucket name: lowercase alphanumerics, dots and hyphens
fn validate_bucket_name(bucket: &str) -> Result<(), ConfigError> {
    if bucket.is_empty() {
        return Err(ConfigError::Validation(
            "bucket cannot be empty".to_string(),
        ));
    }

    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "bucket '{}' may only contain lowercase letters, digits, '.' and '-'",
            bucket
        )));
    }

    if bucket.starts_with(['.', '-']) || bucket.ends_with(['.', '-']) {
        return Err(ConfigError::Validation(format!(
            "bucket '{}' cannot start or end with '.' or '-'",
            bucket
        )));
    }

    Ok(())
}
