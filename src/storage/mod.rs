//! Storage module for persisting captured artifacts
//!
//! This module handles every write to durable object storage, including:
//! - The `ObjectStore` interface (put object, time-limited retrieval link)
//! - A filesystem-backed store that signs its retrieval links
//! - An in-memory store for tests and dry runs
//! - The key layout shared by all stores

mod local;
mod memory;
mod traits;

pub use local::LocalObjectStore;
pub use memory::{MemoryObjectStore, StoredObject};
pub use traits::{validate_key, ObjectStore, StorageError, StorageResult};

use crate::tasks::TaskId;

/// Content type of uploaded screenshots
pub const SCREENSHOT_CONTENT_TYPE: &str = "image/png";

/// Content type of the uploaded address list
pub const SITEMAP_CONTENT_TYPE: &str = "application/json";

/// File name of the screenshot for the `position`-th address (1-based)
pub fn screenshot_filename(position: usize) -> String {
    format!("screenshot_{}.png", position)
}

/// Object key for a screenshot: `{taskId}/screenshots/{filename}`
pub fn screenshot_key(task_id: &TaskId, filename: &str) -> String {
    format!("{}/screenshots/{}", task_id, filename)
}

/// Object key for the serialized address list: `{taskId}/sitemap.json`
pub fn sitemap_key(task_id: &TaskId) -> String {
    format!("{}/sitemap.json", task_id)
}
