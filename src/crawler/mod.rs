//! Crawler module for same-origin link discovery
//!
//! This module contains the link discovery logic, including:
//! - HTTP fetching with HEAD pre-validation and per-request timeouts
//! - HTML parsing and link extraction
//! - The LIFO frontier driving depth-first discovery
//! - The bounded crawl loop itself

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{CrawlResult, LinkCrawler};
pub use fetcher::{build_http_client, check_content_type, fetch_url, FetchResult};
pub use frontier::Frontier;
pub use parser::{parse_html, ParsedPage};

use crate::config::CrawlerConfig;
use crate::RecceError;

/// Runs a single bounded crawl from `seed`
///
/// Convenience wrapper that builds a [`LinkCrawler`] from configuration and
/// runs it once. Only an unusable seed address produces an error; individual
/// page failures are logged and treated as dead ends.
pub async fn crawl(config: &CrawlerConfig, seed: &str) -> Result<CrawlResult, RecceError> {
    LinkCrawler::new(config)?.crawl(seed).await
}
