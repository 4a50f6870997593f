use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Main configuration structure for Site-Recce
///
/// Every section and key has a default, so an empty TOML document is a valid
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
}

/// Link discovery configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Upper bound on the number of pages a single crawl may visit
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Timeout applied to each individual HEAD/GET request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// User agent sent with every crawl request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            request_timeout_secs: 10,
            user_agent: format!("site-recce/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Page rendering and screenshot configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Bound on a single navigation (seconds)
    #[serde(rename = "navigation-timeout-secs")]
    pub navigation_timeout_secs: u64,

    /// Bound on the best-effort wait for `wait_selector` (seconds)
    #[serde(rename = "selector-timeout-secs")]
    pub selector_timeout_secs: u64,

    /// Bound on waiting for the network to settle and the document to load (seconds)
    #[serde(rename = "settle-timeout-secs")]
    pub settle_timeout_secs: u64,

    /// Pause after each scroll step (milliseconds)
    #[serde(rename = "scroll-pause-ms")]
    pub scroll_pause_ms: u64,

    /// Selector that signals meaningful content has rendered
    #[serde(rename = "wait-selector")]
    pub wait_selector: String,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,

    /// Run Chromium with its sandbox enabled (disable inside containers)
    pub sandbox: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            selector_timeout_secs: 10,
            settle_timeout_secs: 15,
            scroll_pause_ms: 1000,
            wait_selector: "img".to_string(),
            window_width: 1920,
            window_height: 1080,
            sandbox: true,
        }
    }
}

impl CaptureConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket that receives screenshots and sitemaps
    pub bucket: String,

    /// Directory backing the filesystem object store
    #[serde(rename = "root-dir")]
    pub root_dir: String,

    /// Base of the retrieval links handed out to callers
    #[serde(rename = "public-base-url")]
    pub public_base_url: String,

    /// Lifetime of a retrieval link (seconds)
    #[serde(rename = "link-expiry-secs")]
    pub link_expiry_secs: u64,

    /// Secret keying retrieval link signatures
    ///
    /// Left unset, a random key is generated per process, so links stay
    /// unforgeable but cannot be verified by anything else.
    #[serde(rename = "signing-key")]
    pub signing_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "recce-results".to_string(),
            root_dir: "./recce-data".to_string(),
            public_base_url: "http://localhost:8080/objects".to_string(),
            link_expiry_secs: 86_400,
            signing_key: random_signing_key(),
        }
    }
}

fn random_signing_key() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

impl StorageConfig {
    pub fn link_expiry(&self) -> Duration {
        Duration::from_secs(self.link_expiry_secs)
    }
}
