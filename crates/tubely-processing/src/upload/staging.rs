//! Scratch files for one upload run.
//!
//! The request body is copied into a [`StagedFile`] backed by a `NamedTempFile`, with the size
//! ceiling enforced while copying. Derived files (the fast-start output) are held in a
//! [`ScratchFile`]. Both remove themselves on drop, so every exit path cleans up.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::validator::{MediaValidator, ValidationError};

#[derive(Debug, Error)]
pub enum StagingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Failed to write staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw upload on local disk. Deleted on drop.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A path owned by the pipeline that is removed on drop, whether or not it was ever created.
#[derive(Debug)]
pub struct ScratchFile(PathBuf);

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => tracing::debug!(path = %self.0.display(), "Removed scratch file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.0.display(),
                error = %e,
                "Failed to remove scratch file"
            ),
        }
    }
}

/// Copy `body` into a fresh temp file under `dir`.
///
/// Fails with [`ValidationError::FileTooLarge`] as soon as the running total passes the
/// validator's ceiling, and with [`ValidationError::EmptyFile`] when nothing arrived.
pub async fn stage_body<S, E>(
    body: S,
    dir: &Path,
    suffix: &str,
    validator: &MediaValidator,
) -> Result<StagedFile, StagingError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let file = tempfile::Builder::new()
        .prefix("tubely-upload-")
        .suffix(suffix)
        .tempfile_in(dir)?;
    let mut writer = tokio::fs::File::from_std(file.reopen()?);

    futures::pin_mut!(body);
    let mut size: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| StagingError::Body(e.to_string()))?;
        size += chunk.len() as u64;
        if size > validator.max_file_size() {
            return Err(ValidationError::FileTooLarge {
                max: validator.max_file_size(),
            }
            .into());
        }
        writer.write_all(&chunk).await?;
    }

    writer.flush().await?;
    writer.sync_all().await?;
    validator.validate_file_size(size)?;

    tracing::debug!(
        path = %file.path().display(),
        size_bytes = size,
        "Upload staged to disk"
    );

    Ok(StagedFile { file, size })
}
