//! Application setup and initialization
//!
//! Everything `main` needs to go from a [`Config`] to a served router.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::JwtService;
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::{PgVideoRepository, VideoRepository};
use tubely_processing::{GeometryProber, StreamOptimizer, UploadConfig, UploadPipeline};
use tubely_storage::{LocalStorage, Storage, UrlResolver};

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let repository: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(pool));

    let (storage, local_assets) = storage::setup_storage(&config).await?;

    let state = build_state(config, repository, storage, local_assets)?;
    let router = routes::build_router(state.clone());

    Ok((state, router))
}

/// Wire the pipeline, resolver and auth around already-built backends.
pub fn build_state(
    config: Config,
    repository: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    local_assets: Option<Arc<LocalStorage>>,
) -> Result<Arc<AppState>> {
    let resolver = UrlResolver::new(
        storage.clone(),
        config.delivery_mode,
        config.public_base_url.clone(),
        config.signed_url_ttl(),
    );

    let prober = GeometryProber::new(config.ffprobe_path.clone(), config.media_tool_timeout())
        .context("Invalid FFPROBE_PATH")?;
    let optimizer = StreamOptimizer::new(config.ffmpeg_path.clone(), config.media_tool_timeout())
        .context("Invalid FFMPEG_PATH")?;

    let pipeline = UploadPipeline::new(
        storage,
        repository.clone(),
        resolver.clone(),
        prober,
        optimizer,
        UploadConfig::from(&config),
    );

    let jwt = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone());

    tracing::info!(
        delivery_mode = ?config.delivery_mode,
        signed_url_ttl_secs = config.signed_url_ttl_secs,
        "Upload pipeline initialized"
    );

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        jwt: Arc::new(jwt),
        repository,
        pipeline: Arc::new(pipeline),
        resolver,
        local_assets,
    }))
}
