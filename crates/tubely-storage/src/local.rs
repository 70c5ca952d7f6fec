//! Local filesystem storage with HMAC-signed read URLs.
//!
//! Signed URLs have the shape `{base_url}/{key}?expires={unix}&signature={hex}` where the
//! signature is HMAC-SHA256 over `{key}\n{expires}`. The `/assets` route checks them with
//! [`LocalStorage::verify_signature`].

use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tubely_core::models::StorageLocation;

/// Container name reported by the local backend.
pub const LOCAL_CONTAINER: &str = "local";

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored objects (e.g., "./assets")
    /// * `base_url` - Base URL the files are served from (e.g., "http://localhost:8091/assets")
    /// * `signing_secret` - HMAC key for signed read URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_secret: signing_secret.into(),
        })
    }

    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn url_for(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }

    fn mac_for(&self, key: &str, expires: u64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Hex signature for `key` valid until `expires` (unix seconds).
    pub fn sign(&self, key: &str, expires: u64) -> StorageResult<String> {
        let mac = self.mac_for(key, expires)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a signature produced by [`LocalStorage::sign`] and that it has not expired.
    pub fn verify_signature(&self, key: &str, expires: u64, signature: &str) -> StorageResult<()> {
        let tag = hex::decode(signature)
            .map_err(|_| StorageError::SigningFailed("Malformed signature".to_string()))?;
        self.mac_for(key, expires)?
            .verify_slice(&tag)
            .map_err(|_| StorageError::SigningFailed("Signature mismatch".to_string()))?;

        if unix_now() > expires {
            return Err(StorageError::SigningFailed(
                "Signed URL has expired".to_string(),
            ));
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl Storage for LocalStorage {
    fn container(&self) -> &str {
        LOCAL_CONTAINER
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<StorageLocation> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(StorageLocation::new(LOCAL_CONTAINER, key))
    }

    /// Streams `source` into place instead of buffering it.
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<StorageLocation> {
        let path = self.key_to_path(key)?;

        let mut reader = fs::File::open(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let size = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put successful"
        );

        Ok(StorageLocation::new(LOCAL_CONTAINER, key))
    }

    async fn get_object(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn public_url(&self, location: &StorageLocation) -> String {
        self.url_for(&location.key)
    }

    async fn signed_get_url(
        &self,
        location: &StorageLocation,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.ensure_container(location)?;
        validate_key(&location.key)?;

        let expires = unix_now() + expires_in.as_secs();
        let signature = self.sign(&location.key, expires)?;

        Ok(format!(
            "{}?expires={}&signature={}",
            self.url_for(&location.key),
            expires,
            signature
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage(dir: &TempDir) -> LocalStorage {
        LocalStorage::new(
            dir.path(),
            "http://localhost:8091/assets/".to_string(),
            b"local-signing-secret".to_vec(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;

        let loc = store
            .put_object("landscape/abc.mp4", Bytes::from_static(b"video"), "video/mp4")
            .await
            .unwrap();
        assert_eq!(loc.container, LOCAL_CONTAINER);
        assert_eq!(loc.key, "landscape/abc.mp4");
        assert!(dir.path().join("landscape/abc.mp4").exists());

        let data = store.get_object("landscape/abc.mp4").await.unwrap();
        assert_eq!(&data[..], b"video");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;
        let err = store.get_object("portrait/missing.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;
        let err = store
            .put_object("../escape.mp4", Bytes::from_static(b"x"), "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_put_file() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;
        let src = dir.path().join("staged.bin");
        std::fs::write(&src, b"optimized").unwrap();

        store
            .put_file("other/xyz.mp4", &src, "video/mp4")
            .await
            .unwrap();
        let data = store.get_object("other/xyz.mp4").await.unwrap();
        assert_eq!(&data[..], b"optimized");
    }

    #[tokio::test]
    async fn test_put_file_missing_source_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;

        let err = store
            .put_file("other/gone.mp4", &dir.path().join("gone.bin"), "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert!(matches!(
            store.get_object("other/gone.mp4").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_public_url() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;
        let loc = StorageLocation::new(LOCAL_CONTAINER, "portrait/abc.mp4");
        assert_eq!(
            store.public_url(&loc),
            "http://localhost:8091/assets/portrait/abc.mp4"
        );
    }

    #[tokio::test]
    async fn test_signed_url_verifies() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;
        let loc = StorageLocation::new(LOCAL_CONTAINER, "landscape/abc.mp4");

        let url = store
            .signed_get_url(&loc, Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:8091/assets/landscape/abc.mp4?expires="));

        let query = url.split_once('?').unwrap().1;
        let mut expires = 0u64;
        let mut signature = String::new();
        for pair in query.split('&') {
            let (k, v) = pair.split_once('=').unwrap();
            match k {
                "expires" => expires = v.parse().unwrap(),
                "signature" => signature = v.to_string(),
                _ => {}
            }
        }
        let now = unix_now();
        assert!(expires > now && expires <= now + 3600);
        assert!(store
            .verify_signature("landscape/abc.mp4", expires, &signature)
            .is_ok());
        assert!(store
            .verify_signature("portrait/abc.mp4", expires, &signature)
            .is_err());
    }

    #[tokio::test]
    async fn test_expired_signature_rejected() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;
        let expires = unix_now() - 10;
        let signature = store.sign("landscape/abc.mp4", expires).unwrap();
        assert!(store
            .verify_signature("landscape/abc.mp4", expires, &signature)
            .is_err());
    }

    #[tokio::test]
    async fn test_signed_url_rejects_foreign_container() {
        let dir = TempDir::new().unwrap();
        let store = storage(&dir).await;
        let loc = StorageLocation::new("tubely-media", "landscape/abc.mp4");
        let err = store
            .signed_get_url(&loc, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ContainerMismatch { .. }));
    }
}
