//! Upload orchestrator.
//!
//! One call runs one upload to completion. The record is loaded and ownership checked before
//! any byte of the body is read or any temp file exists. Every scratch file is an RAII guard,
//! so cleanup happens on all exit paths. The object-store put and the record update are not
//! transactional: if the update fails, the stored object is orphaned and logged.

use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use std::fmt::Display;
use std::sync::Arc;
use tubely_core::constants::THUMBNAIL_KEY_PREFIX;
use tubely_core::models::{StorageLocation, Video};
use tubely_db::VideoRepository;
use tubely_storage::{Storage, UrlResolver};
use uuid::Uuid;

use super::guard::authorize;
use super::staging::{stage_body, ScratchFile, StagedFile};
use super::types::{PipelineError, UploadConfig, UploadStage};
use crate::keys;
use crate::validator::MediaValidator;
use crate::video::faststart::has_faststart_marker;
use crate::video::{classify, orientation_of, GeometryProber, Orientation, StreamOptimizer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AssetKind {
    Video,
    Thumbnail,
}

pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    repository: Arc<dyn VideoRepository>,
    resolver: UrlResolver,
    prober: GeometryProber,
    optimizer: StreamOptimizer,
    config: UploadConfig,
    video_validator: MediaValidator,
    thumbnail_validator: MediaValidator,
}

impl UploadPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        repository: Arc<dyn VideoRepository>,
        resolver: UrlResolver,
        prober: GeometryProber,
        optimizer: StreamOptimizer,
        config: UploadConfig,
    ) -> Self {
        Self {
            video_validator: MediaValidator::video(config.max_video_size_bytes),
            thumbnail_validator: MediaValidator::thumbnail(config.max_thumbnail_size_bytes),
            storage,
            repository,
            resolver,
            prober,
            optimizer,
            config,
        }
    }

    /// Load a record, or `VideoNotFound`.
    pub async fn load_video(&self, video_id: Uuid) -> Result<Video, PipelineError> {
        self.repository
            .get_video(video_id)
            .await
            .map_err(PipelineError::Repository)?
            .ok_or(PipelineError::VideoNotFound(video_id))
    }

    /// Load a record and run the ownership guard against it.
    async fn load_owned(&self, video_id: Uuid, user_id: Uuid) -> Result<Video, PipelineError> {
        let video = self.load_video(video_id).await?;
        authorize(&video, user_id)?;
        Ok(video)
    }

    /// Run the full video path and return the updated record with resolved URLs.
    #[tracing::instrument(skip(self, body), fields(video_id = %video_id, user_id = %user_id))]
    pub async fn upload_video<S, E>(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, PipelineError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let mut stage = UploadStage::Received;
        let result = self
            .run_video(&mut stage, video_id, user_id, content_type, body)
            .await;
        if let Err(ref e) = result {
            tracing::warn!(stage = %stage, error = %e, "Video upload failed");
        }
        result
    }

    /// Run the thumbnail path: stage, key, store, record. No remux or metadata read.
    #[tracing::instrument(skip(self, body), fields(video_id = %video_id, user_id = %user_id))]
    pub async fn upload_thumbnail<S, E>(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, PipelineError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let mut stage = UploadStage::Received;
        let result = self
            .run_thumbnail(&mut stage, video_id, user_id, content_type, body)
            .await;
        if let Err(ref e) = result {
            tracing::warn!(stage = %stage, error = %e, "Thumbnail upload failed");
        }
        result
    }

    async fn run_video<S, E>(
        &self,
        stage: &mut UploadStage,
        video_id: Uuid,
        user_id: Uuid,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, PipelineError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let video = self.load_owned(video_id, user_id).await?;
        let content_type = self.video_validator.validate_content_type(content_type)?;
        let ext = keys::extension_for(&content_type)?;

        let staged = stage_body(body, &self.config.temp_dir, &ext, &self.video_validator).await?;
        advance(stage, UploadStage::Staged, &staged);

        let optimized = ScratchFile::new(StreamOptimizer::output_path(staged.path()));
        self.optimizer.optimize(staged.path()).await?;
        match has_faststart_marker(optimized.path()).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                path = %optimized.path().display(),
                "moov atom not found in the first MiB after fast-start remux"
            ),
            Err(e) => tracing::warn!(error = %e, "Could not verify fast-start layout"),
        }
        advance(stage, UploadStage::Optimized, &staged);

        let geometry = match self.prober.probe(optimized.path()).await {
            Ok(geometry) => Some(geometry),
            Err(e) => {
                tracing::warn!(error = %e, "Probe failed, continuing with unknown orientation");
                None
            }
        };
        advance(stage, UploadStage::Probed, &staged);

        let orientation = match geometry.map(|g| classify(g.width, g.height)) {
            Some(Ok(label)) => orientation_of(label),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Aspect classification failed");
                Orientation::Other
            }
            None => Orientation::Other,
        };
        advance(stage, UploadStage::Classified, &staged);

        let key = keys::derive_key(&keys::random_id(), &content_type, orientation.as_str())?;
        advance(stage, UploadStage::Keyed, &staged);

        let location = self
            .storage
            .put_file(&key, optimized.path(), &content_type)
            .await?;
        advance(stage, UploadStage::Stored, &staged);

        let updated = self
            .record_location(video, &location, AssetKind::Video)
            .await?;
        advance(stage, UploadStage::RecordUpdated, &staged);

        tracing::info!(
            key = %location.key,
            container = %location.container,
            orientation = %orientation,
            size_bytes = staged.size(),
            "Video upload completed"
        );

        Ok(self.resolver.resolve_video(updated).await?)
    }

    async fn run_thumbnail<S, E>(
        &self,
        stage: &mut UploadStage,
        video_id: Uuid,
        user_id: Uuid,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, PipelineError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let video = self.load_owned(video_id, user_id).await?;
        let content_type = self.thumbnail_validator.validate_content_type(content_type)?;
        let ext = keys::extension_for(&content_type)?;

        let staged = stage_body(
            body,
            &self.config.temp_dir,
            &ext,
            &self.thumbnail_validator,
        )
        .await?;
        advance(stage, UploadStage::Staged, &staged);

        let key = keys::derive_key(&keys::random_id(), &content_type, THUMBNAIL_KEY_PREFIX)?;
        advance(stage, UploadStage::Keyed, &staged);

        let location = self
            .storage
            .put_file(&key, staged.path(), &content_type)
            .await?;
        advance(stage, UploadStage::Stored, &staged);

        let updated = self
            .record_location(video, &location, AssetKind::Thumbnail)
            .await?;
        advance(stage, UploadStage::RecordUpdated, &staged);

        tracing::info!(
            key = %location.key,
            container = %location.container,
            size_bytes = staged.size(),
            "Thumbnail upload completed"
        );

        Ok(self.resolver.resolve_video(updated).await?)
    }

    async fn record_location(
        &self,
        mut video: Video,
        location: &StorageLocation,
        kind: AssetKind,
    ) -> Result<Video, PipelineError> {
        let value = Some(self.resolver.persisted_value(location));
        match kind {
            AssetKind::Video => video.video_url = value,
            AssetKind::Thumbnail => video.thumbnail_url = value,
        }
        video.updated_at = Utc::now();

        self.repository.update_video(&video).await.map_err(|e| {
            tracing::error!(
                error = %e,
                video_id = %video.id,
                container = %location.container,
                key = %location.key,
                "Record update failed after put; stored object is orphaned"
            );
            PipelineError::Repository(e)
        })
    }
}

fn advance(stage: &mut UploadStage, next: UploadStage, staged: &StagedFile) {
    tracing::debug!(
        from = %stage,
        to = %next,
        staged = %staged.path().display(),
        "Upload stage transition"
    );
    *stage = next;
}
