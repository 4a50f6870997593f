//! Site-Recce: crawl-and-capture reconnaissance for a single site
//!
//! This crate turns a seed address into a bounded sitemap of same-origin pages,
//! renders each discovered page in a headless browser to capture a full-page
//! screenshot, and records the API calls every page issues while rendering.
//! Screenshots are persisted to object storage and exposed as time-limited
//! retrieval links.

pub mod capture;
pub mod config;
pub mod crawler;
pub mod output;
pub mod sitemap;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Recce operations
#[derive(Debug, Error)]
pub enum RecceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Capture error: {0}")]
    Capture(#[from] capture::CaptureError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::TaskStatus,
        to: state::TaskStatus,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(tasks::TaskId),

    #[error("Addresses already recorded for task {0}")]
    AddressesAlreadySet(tasks::TaskId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Site-Recce operations
pub type Result<T> = std::result::Result<T, RecceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlResult, LinkCrawler};
pub use sitemap::{build_tree, SitemapNode};
pub use state::TaskStatus;
pub use tasks::{Orchestrator, TaskId, TaskSnapshot, TaskStore};
pub use url::{normalize_url, origin_of, same_origin};
