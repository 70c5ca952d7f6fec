use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tubely_core::{AppError, Config};
use tubely_storage::{SigningError, StorageError};
use uuid::Uuid;

use super::staging::StagingError;
use crate::keys::KeyError;
use crate::validator::ValidationError;
use crate::video::OptimizeError;

/// Limits and scratch location for the upload paths.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub temp_dir: PathBuf,
}

impl From<&Config> for UploadConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_video_size_bytes: config.max_video_size_bytes,
            max_thumbnail_size_bytes: config.max_thumbnail_size_bytes,
            temp_dir: config.upload_temp_dir.clone(),
        }
    }
}

/// States of one upload run, in order. Failure can happen from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadStage {
    Received,
    Staged,
    Optimized,
    Probed,
    Classified,
    Keyed,
    Stored,
    RecordUpdated,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Received => "received",
            UploadStage::Staged => "staged",
            UploadStage::Optimized => "optimized",
            UploadStage::Probed => "probed",
            UploadStage::Classified => "classified",
            UploadStage::Keyed => "keyed",
            UploadStage::Stored => "stored",
            UploadStage::RecordUpdated => "record_updated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Video {0} not found")]
    VideoNotFound(Uuid),

    #[error("User {user_id} does not own video {video_id}")]
    NotOwner { video_id: Uuid, user_id: Uuid },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("Metadata store error: {0}")]
    Repository(#[source] AppError),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::VideoNotFound(id) => AppError::NotFound(format!("Video {} not found", id)),
            PipelineError::NotOwner { .. } => {
                AppError::Unauthorized("User does not own this video".to_string())
            }
            PipelineError::Validation(e) => match e {
                ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
                ValidationError::InvalidContentType { .. }
                | ValidationError::MissingContentType => {
                    AppError::UnsupportedMediaType(e.to_string())
                }
                ValidationError::EmptyFile => AppError::InvalidInput(e.to_string()),
            },
            PipelineError::Staging(StagingError::Validation(e)) => {
                AppError::from(PipelineError::Validation(e))
            }
            PipelineError::Staging(StagingError::Body(msg)) => {
                AppError::InvalidInput(format!("Failed to read upload: {}", msg))
            }
            PipelineError::Staging(StagingError::Io(e)) => AppError::InternalWithSource {
                message: "Failed to stage upload".to_string(),
                source: e.into(),
            },
            PipelineError::Optimize(e) => AppError::MediaProcessing(e.to_string()),
            PipelineError::Key(e) => AppError::MediaProcessing(e.to_string()),
            PipelineError::Storage(e) => AppError::Storage(e.to_string()),
            PipelineError::Signing(e) => AppError::Signing(e.to_string()),
            PipelineError::Repository(e) => e,
        }
    }
}
