//! Storage traits and error types
//!
//! This module defines the trait interface for object storage backends and
//! associated error types.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Retrieval link expired at {0}")]
    LinkExpired(i64),

    #[error("Retrieval link signature does not match")]
    BadSignature,

    #[error("Cannot sign retrieval link: {0}")]
    Signing(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for object storage backend implementations
///
/// This is the "put object / get time-limited link" service the capture phase
/// writes screenshots through. Implementations must be shareable across tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `bucket/key`, replacing any existing object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Reads an object back
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Returns a link granting read access to `bucket/key` for `expiry`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no object is stored under the key.
    async fn presigned_url(&self, bucket: &str, key: &str, expiry: Duration)
        -> StorageResult<String>;
}

/// Checks that a key is a relative, `/`-separated path with no empty, `.` or
/// `..` segments
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(())
}
