//! Storage setup and initialization

use anyhow::Result;
use std::sync::Arc;
use tubely_core::{Config, StorageBackend};
use tubely_storage::{create_storage, LocalStorage, Storage};

/// Build the configured backend. For the local backend the concrete handle is returned
/// too, so `/assets` can verify signatures and read files.
pub async fn setup_storage(
    config: &Config,
) -> Result<(Arc<dyn Storage>, Option<Arc<LocalStorage>>)> {
    tracing::info!("Initializing storage...");

    let (storage, local): (Arc<dyn Storage>, Option<Arc<LocalStorage>>) =
        match config.storage_backend {
            StorageBackend::Local => {
                let local = Arc::new(
                    LocalStorage::new(
                        config.local_storage_path.clone(),
                        config.local_storage_base_url.clone(),
                        config.local_signing_secret.as_bytes().to_vec(),
                    )
                    .await?,
                );
                (local.clone(), Some(local))
            }
            StorageBackend::S3 => (create_storage(config).await?, None),
        };

    tracing::info!(
        backend = ?storage.backend_type(),
        container = %storage.container(),
        "Storage initialized successfully"
    );

    Ok((storage, local))
}
