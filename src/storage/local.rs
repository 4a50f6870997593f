//! Filesystem-backed object store
//!
//! Objects live at `root_dir/bucket/key`. Retrieval links carry their own
//! expiry and an HMAC-SHA256 signature over bucket, key and expiry, so
//! whatever serves `public_base_url` can check them with the shared secret
//! and no other state.

use crate::config::StorageConfig;
use crate::storage::traits::{validate_key, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::PathBuf;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Object store writing to a local directory
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root_dir: PathBuf,
    public_base_url: String,
    signing_key: String,
}

impl LocalObjectStore {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        signing_key: impl Into<String>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            signing_key: signing_key.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            &config.root_dir,
            &config.public_base_url,
            &config.signing_key,
        )
    }

    /// Checks a retrieval link's expiry and signature
    ///
    /// `now` is a Unix timestamp in seconds. A link is valid up to and
    /// including its `expires` second.
    #[cfg(test)]
    fn verify_link(
        &self,
        bucket: &str,
        key: &str,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> StorageResult<()> {
        if now > expires {
            return Err(StorageError::LinkExpired(expires));
        }

        let signature = hex::decode(signature).map_err(|_| StorageError::BadSignature)?;
        link_mac(&self.signing_key, bucket, key, expires)?
            .verify_slice(&signature)
            .map_err(|_| StorageError::BadSignature)
    }

    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        if bucket.contains('/') {
            return Err(StorageError::InvalidKey(bucket.to_string()));
        }
        validate_key(bucket)?;
        validate_key(key)?;

        let mut path = self.root_dir.join(bucket);
        for segment in key.split('/') {
            path.push(segment);
        }
        Ok(path)
    }
}

/// HMAC over the signed fields of a retrieval link, ready to finalize or verify
fn link_mac(signing_key: &str, bucket: &str, key: &str, expires: i64) -> StorageResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(signing_key.as_bytes())
        .map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(bucket.as_bytes());
    mac.update(b"\n");
    mac.update(key.as_bytes());
    mac.update(b"\n");
    mac.update(expires.to_string().as_bytes());
    Ok(mac)
}

/// Hex HMAC-SHA256 signature of a retrieval link
fn sign(signing_key: &str, bucket: &str, key: &str, expires: i64) -> StorageResult<String> {
    let mac = link_mac(signing_key, bucket, key, expires)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(
            "Stored {}/{} ({} bytes, {})",
            bucket,
            key,
            bytes.len(),
            content_type
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> StorageResult<String> {
        let path = self.object_path(bucket, key)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let expiry_secs = i64::try_from(expiry.as_secs()).unwrap_or(i64::MAX);
        let expires = chrono::Utc::now().timestamp().saturating_add(expiry_secs);
        let signature = sign(&self.signing_key, bucket, key, expires)?;

        Ok(format!(
            "{}/{}/{}?expires={}&signature={}",
            self.public_base_url, bucket, key, expires, signature
        ))
    }
}
