//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tubely_core::models::StorageLocation;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Unknown container '{actual}' (this store serves '{expected}')")]
    ContainerMismatch { expected: String, actual: String },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// The upload pipeline and the URL resolver only ever talk to this trait, so the
/// object store can be S3, an S3-compatible provider, or a local directory.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Container (bucket) this store writes into.
    fn container(&self) -> &str;

    /// Put an object in a single request and return its location.
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<StorageLocation>;

    /// Put the contents of a local file.
    ///
    /// The whole file is read and sent in one put; no multipart semantics.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<StorageLocation> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.put_object(key, Bytes::from(data), content_type).await
    }

    /// Fetch an object's bytes.
    async fn get_object(&self, key: &str) -> StorageResult<Bytes>;

    /// Format the permanent public URL of a location. Pure, no network call.
    fn public_url(&self, location: &StorageLocation) -> String;

    /// Mint a time-limited read URL for a location.
    async fn signed_get_url(
        &self,
        location: &StorageLocation,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Reject locations that belong to another container.
    fn ensure_container(&self, location: &StorageLocation) -> StorageResult<()> {
        if location.container != self.container() {
            return Err(StorageError::ContainerMismatch {
                expected: self.container().to_string(),
                actual: location.container.clone(),
            });
        }
        Ok(())
    }
}

/// Validate a key before it reaches a backend.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("landscape/abc.mp4").is_ok());
        assert!(validate_key("thumbnails/abc.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("portrait/../../secret").is_err());
        assert!(validate_key("other\\abc.mp4").is_err());
    }
}
