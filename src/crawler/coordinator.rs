//! Crawl coordinator - bounded same-origin link discovery
//!
//! This module contains the crawl loop that turns a seed address into an
//! ordered set of discovered pages:
//! - Normalizing the seed and confining the crawl to its origin
//! - Driving the LIFO frontier
//! - Fetching and parsing each page
//! - Treating any per-page failure as a dead end

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::parse_html;
use crate::url::{normalize_url, same_origin};
use crate::RecceError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Ordered addresses discovered by one crawl
///
/// Insertion order is discovery order: the seed is always first, and the rest
/// follow the depth-first bias of the LIFO frontier rather than BFS levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    seed: String,
    addresses: Vec<String>,
}

impl CrawlResult {
    /// The normalized seed address
    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    #[cfg(test)]
    fn contains(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }

    pub fn into_addresses(self) -> Vec<String> {
        self.addresses
    }
}

/// Bounded same-origin crawler
pub struct LinkCrawler {
    client: Client,
    max_pages: usize,
}

impl LinkCrawler {
    /// Creates a crawler with an HTTP client built from configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, RecceError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config.max_pages))
    }

    /// Creates a crawler around an existing HTTP client
    pub fn with_client(client: Client, max_pages: usize) -> Self {
        Self { client, max_pages }
    }

    /// Crawls from `seed`, returning at most `max_pages` same-origin addresses
    ///
    /// # Algorithm
    ///
    /// 1. Normalize the seed and push it onto the frontier
    /// 2. While the frontier is non-empty and fewer than `max_pages` pages
    ///    have been visited:
    ///    a. Pop the most recently pushed address
    ///    b. Skip it if already visited
    ///    c. Mark visited, append to the result
    ///    d. Fetch and parse the page
    ///    e. Push every same-origin, unvisited link
    ///
    /// A fetch or parse failure is logged and treated as "no outgoing links";
    /// it never aborts the crawl.
    ///
    /// # Errors
    ///
    /// Only an unusable seed address (unparseable, non-HTTP, no host) fails.
    pub async fn crawl(&self, seed: &str) -> Result<CrawlResult, RecceError> {
        let seed_url = normalize_url(seed)?;

        let mut visited: HashSet<String> = HashSet::new();
        let mut addresses: Vec<String> = Vec::new();
        let mut frontier = Frontier::seeded(seed_url.clone());

        tracing::info!("Crawling {} (max {} pages)", seed_url, self.max_pages);

        while visited.len() < self.max_pages {
            let Some(url) = frontier.pop() else {
                break;
            };

            if visited.contains(url.as_str()) {
                continue;
            }

            visited.insert(url.to_string());
            addresses.push(url.to_string());
            tracing::debug!("Visiting {} ({}/{})", url, visited.len(), self.max_pages);

            for link in self.outgoing_links(&url).await {
                let Ok(normalized) = normalize_url(&link) else {
                    tracing::trace!("Skipping unnormalizable link {}", link);
                    continue;
                };

                if same_origin(&seed_url, &normalized) && !visited.contains(normalized.as_str()) {
                    frontier.push(normalized);
                }
            }
        }

        tracing::info!(
            "Crawl of {} finished: {} pages discovered, {} left in frontier",
            seed_url,
            addresses.len(),
            frontier.len()
        );

        Ok(CrawlResult {
            seed: seed_url.to_string(),
            addresses,
        })
    }

    /// Fetches a page and returns its links, or nothing on any failure
    async fn outgoing_links(&self, url: &Url) -> Vec<String> {
        match fetch_url(&self.client, url.as_str()).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                // Redirects change the base that relative links resolve against
                let base = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
                let parsed = parse_html(&body, &base);
                tracing::debug!(
                    "Parsed {} ({}): {} links",
                    url,
                    parsed.title.as_deref().unwrap_or("untitled"),
                    parsed.links.len()
                );
                parsed.links
            }
            FetchResult::ContentMismatch { content_type } => {
                tracing::debug!("Not following {}: content type {}", url, content_type);
                Vec::new()
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Error crawling {}: HTTP {}", url, status_code);
                Vec::new()
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Error crawling {}: {}", url, error);
                Vec::new()
            }
        }
    }
}
