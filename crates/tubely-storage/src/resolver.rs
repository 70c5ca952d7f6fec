//! Turns stored locations into URLs a player can fetch.
//!
//! In [`DeliveryMode::Direct`] the URL is a pure function of the key and is persisted on
//! the record as-is. In [`DeliveryMode::Signed`] the record stores the `container,key`
//! composite and a fresh signed URL is minted on every read.

use crate::traits::{Storage, StorageError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tubely_core::models::{InvalidLocation, StorageLocation, Video};
use tubely_core::DeliveryMode;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error(transparent)]
    MalformedLocation(#[from] InvalidLocation),

    #[error("Failed to sign URL: {0}")]
    Rejected(#[from] StorageError),
}

#[derive(Clone)]
pub struct UrlResolver {
    storage: Arc<dyn Storage>,
    mode: DeliveryMode,
    public_base_url: Option<String>,
    ttl: Duration,
}

impl UrlResolver {
    pub fn new(
        storage: Arc<dyn Storage>,
        mode: DeliveryMode,
        public_base_url: Option<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            storage,
            mode,
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
            ttl,
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Permanent URL of a location. Uses the CDN base when one is configured.
    pub fn direct_url(&self, location: &StorageLocation) -> String {
        match self.public_base_url {
            Some(ref base) => format!("{}/{}", base, location.key),
            None => self.storage.public_url(location),
        }
    }

    /// Value written to the record's URL field for a freshly stored object.
    pub fn persisted_value(&self, location: &StorageLocation) -> String {
        match self.mode {
            DeliveryMode::Direct => self.direct_url(location),
            DeliveryMode::Signed => location.to_composite(),
        }
    }

    /// Resolve a location to a URL for the configured mode.
    pub async fn resolve(&self, location: &StorageLocation) -> Result<String, SigningError> {
        match self.mode {
            DeliveryMode::Direct => Ok(self.direct_url(location)),
            DeliveryMode::Signed => Ok(self.storage.signed_get_url(location, self.ttl).await?),
        }
    }

    /// Resolve a value previously produced by [`UrlResolver::persisted_value`].
    pub async fn resolve_persisted(&self, value: &str) -> Result<String, SigningError> {
        match self.mode {
            DeliveryMode::Direct => Ok(value.to_string()),
            DeliveryMode::Signed => {
                let location = StorageLocation::parse_composite(value)?;
                Ok(self.storage.signed_get_url(&location, self.ttl).await?)
            }
        }
    }

    /// Replace the stored URL fields of a record with resolved URLs.
    ///
    /// Records without a video or thumbnail pass through untouched.
    pub async fn resolve_video(&self, mut video: Video) -> Result<Video, SigningError> {
        if self.mode == DeliveryMode::Direct {
            return Ok(video);
        }
        if let Some(ref stored) = video.video_url {
            video.video_url = Some(self.resolve_persisted(stored).await?);
        }
        if let Some(ref stored) = video.thumbnail_url {
            video.thumbnail_url = Some(self.resolve_persisted(stored).await?);
        }
        Ok(video)
    }
}
