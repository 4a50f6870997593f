//! Capture module for rendering pages and taking screenshots
//!
//! This module drives a headless browser over the pages discovered for a task:
//! - `BrowserDriver` / `RenderSession`: the browser-automation interface
//! - `ChromeDriver`: headless Chromium over the DevTools protocol
//! - `RequestObserver`: where intercepted XHR/fetch calls are delivered
//! - `CaptureEngine`: the per-task capture loop

mod browser;
mod engine;
mod observer;

pub use browser::{BrowserDriver, ChromeDriver, RenderSession};
pub use engine::CaptureEngine;
pub use observer::RequestObserver;

use crate::storage::StorageError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while rendering or capturing a page
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to launch browser session: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("Failed to shut down browser session: {0}")]
    Shutdown(String),
}

/// Result type for capture operations
///
/// Named apart from `Result` because `CaptureResult` is the per-page record.
pub type CaptureOutcome<T> = std::result::Result<T, CaptureError>;

/// Scrolls to the bottom of the document to trigger lazy loading
pub(crate) const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Scrolls back to the top before the final capture
pub(crate) const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0)";
