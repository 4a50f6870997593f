//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made during link discovery:
//! - Building HTTP clients with the configured user agent and timeout
//! - HEAD requests to pre-validate Content-Type
//! - GET requests to fetch page content
//! - Error classification

use crate::config::CrawlerConfig;
use reqwest::{header::CONTENT_TYPE, Client, Response};

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects; relative links resolve against it
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body decoding, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds the HTTP client used for crawling
///
/// Every request carries the configured user agent and is bounded by
/// `request-timeout-secs`; redirects are followed by reqwest's default policy.
///
/// # Example
///
/// ```no_run
/// use site_recce::config::CrawlerConfig;
/// use site_recce::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL for link extraction
///
/// # Request Flow
///
/// 1. Send HEAD request to check Content-Type
///    - If it answers with a non-HTML type → ContentMismatch, no GET is sent
///    - If HEAD fails or is unsupported → fall through to GET
/// 2. Send GET request
/// 3. Classify the response
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML (or missing) Content-Type | Success |
/// | 2xx with other Content-Type | ContentMismatch |
/// | Non-2xx status | HttpError |
/// | Timeout / connection / body error | NetworkError |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    if let Some(content_type) = check_content_type(client, url).await {
        if !is_html(&content_type) {
            return FetchResult::ContentMismatch { content_type };
        }
    }

    match client.get(url).send().await {
        Ok(response) => classify_response(response).await,
        Err(e) => classify_error(e),
    }
}

/// Sends a HEAD request to learn the Content-Type before fetching
///
/// Returns `None` whenever HEAD does not give a usable answer (network error,
/// non-success status, missing header); the caller then decides from the GET.
pub async fn check_content_type(client: &Client, url: &str) -> Option<String> {
    let response = match client.head(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("HEAD {} failed: {}", url, e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("HEAD {} returned {}", url, response.status());
        return None;
    }

    header_content_type(&response)
}

async fn classify_response(response: Response) -> FetchResult {
    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    if let Some(content_type) = header_content_type(&response) {
        if !is_html(&content_type) {
            return FetchResult::ContentMismatch { content_type };
        }
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };

    FetchResult::NetworkError { error }
}

fn header_content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// HTML and XHTML documents are worth parsing for links
fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}
