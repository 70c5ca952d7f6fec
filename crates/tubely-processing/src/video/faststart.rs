//! Fast-start remux: rewrite an MP4 so the `moov` index precedes the media data.
//!
//! Streams are copied, never re-encoded. The optimizer writes `<input>.processing` and leaves
//! cleanup of both files to the caller.

use crate::command::{run_tool, validate_tool_path, ToolError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Suffix appended to the input path for the optimized output.
pub const OUTPUT_SUFFIX: &str = ".processing";

/// How far into the output the `moov` marker is searched for.
pub const MARKER_WINDOW_BYTES: u64 = 1024 * 1024;

const MOOV_MARKER: &[u8] = b"moov";

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("ffmpeg exited with {status}: {output}")]
    Failed { status: String, output: String },
}

pub struct StreamOptimizer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl StreamOptimizer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }

    /// Path the optimized copy of `input` is written to.
    pub fn output_path(input: &Path) -> PathBuf {
        let mut path: OsString = input.as_os_str().to_owned();
        path.push(OUTPUT_SUFFIX);
        PathBuf::from(path)
    }

    /// Remux `input` into [`StreamOptimizer::output_path`] and return that path.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    pub async fn optimize(&self, input: &Path) -> Result<PathBuf, OptimizeError> {
        let output_path = Self::output_path(input);

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path);

        let output = run_tool(&mut cmd, "ffmpeg", self.timeout).await?;

        if !output.success() {
            let diagnostics = output.diagnostics();
            tracing::error!(
                status = %output.status,
                output = %diagnostics,
                "ffmpeg fast-start remux failed"
            );
            return Err(OptimizeError::Failed {
                status: output.status.to_string(),
                output: diagnostics,
            });
        }

        tracing::info!(
            duration_ms = output.duration_ms,
            output = %output_path.display(),
            "Fast-start remux completed"
        );

        Ok(output_path)
    }
}

/// Whether the `moov` marker appears within the first [`MARKER_WINDOW_BYTES`] of `path`.
pub async fn has_faststart_marker(path: &Path) -> std::io::Result<bool> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::new();
    file.take(MARKER_WINDOW_BYTES).read_to_end(&mut head).await?;
    Ok(head
        .windows(MOOV_MARKER.len())
        .any(|window| window == MOOV_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            StreamOptimizer::output_path(Path::new("/tmp/upload-abc.mp4")),
            PathBuf::from("/tmp/upload-abc.mp4.processing")
        );
    }

    #[tokio::test]
    async fn test_marker_found_near_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fast.mp4");
        let mut data = b"\0\0\0\x20ftypisom".to_vec();
        data.extend_from_slice(b"\0\0\x10\0moov");
        data.resize(4096, 0);
        std::fs::write(&path, &data).unwrap();
        assert!(has_faststart_marker(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_beyond_window_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.mp4");
        let mut data = vec![0u8; MARKER_WINDOW_BYTES as usize + 16];
        data.extend_from_slice(b"moov");
        std::fs::write(&path, &data).unwrap();
        assert!(!has_faststart_marker(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_missing_file() {
        assert!(has_faststart_marker(Path::new("/nonexistent/tubely.mp4"))
            .await
            .is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_remux_carries_output() {
        let optimizer = StreamOptimizer::new("false", Duration::from_secs(5)).unwrap();
        let err = optimizer
            .optimize(Path::new("/tmp/tubely-missing.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Failed { .. }));
    }
}
