//! Geometry prober - frame size extraction via ffprobe

use crate::command::{run_tool, validate_tool_path, ToolError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("ffprobe exited with {status}: {output}")]
    Failed { status: String, output: String },

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("ffprobe reported no streams")]
    NoStreams,

    #[error("First stream has no usable dimensions (width={width:?}, height={height:?})")]
    InvalidDimensions {
        width: Option<i64>,
        height: Option<i64>,
    },
}

/// Pixel size of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<i64>,
    height: Option<i64>,
}

/// Read the geometry of stream 0 from ffprobe's JSON output.
pub fn parse_geometry(stdout: &[u8]) -> Result<Geometry, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;
    let stream = output.streams.first().ok_or(ProbeError::NoStreams)?;

    match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => match (u32::try_from(w), u32::try_from(h)) {
            (Ok(width), Ok(height)) => Ok(Geometry { width, height }),
            _ => Err(ProbeError::InvalidDimensions {
                width: stream.width,
                height: stream.height,
            }),
        },
        _ => Err(ProbeError::InvalidDimensions {
            width: stream.width,
            height: stream.height,
        }),
    }
}

pub struct GeometryProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl GeometryProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, path: &Path) -> Result<Geometry, ProbeError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path);

        let output = run_tool(&mut cmd, "ffprobe", self.timeout).await?;

        if !output.success() {
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                output: output.diagnostics(),
            });
        }

        let geometry = parse_geometry(&output.stdout)?;

        tracing::info!(
            duration_ms = output.duration_ms,
            width = geometry.width,
            height = geometry.height,
            "Video probe completed"
        );

        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_stream_only() {
        let json = br#"{"streams":[{"index":0,"codec_type":"video","width":1920,"height":1080},
            {"index":1,"codec_type":"video","width":640,"height":480}]}"#;
        assert_eq!(
            parse_geometry(json).unwrap(),
            Geometry {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn test_parse_no_streams() {
        assert!(matches!(
            parse_geometry(br#"{"streams":[]}"#),
            Err(ProbeError::NoStreams)
        ));
        assert!(matches!(parse_geometry(br#"{}"#), Err(ProbeError::NoStreams)));
    }

    #[test]
    fn test_parse_missing_or_bad_dimensions() {
        assert!(matches!(
            parse_geometry(br#"{"streams":[{"codec_type":"audio"}]}"#),
            Err(ProbeError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            parse_geometry(br#"{"streams":[{"width":0,"height":1080}]}"#),
            Err(ProbeError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            parse_geometry(br#"{"streams":[{"width":-4,"height":1080}]}"#),
            Err(ProbeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_geometry(b"not json"),
            Err(ProbeError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_unsafe_tool_path() {
        assert!(GeometryProber::new("ffprobe | sh", Duration::from_secs(1)).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let prober =
            GeometryProber::new("/nonexistent/ffprobe", Duration::from_secs(1)).unwrap();
        let err = prober.probe(Path::new("/tmp/none.mp4")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Tool(ToolError::Spawn { .. })));
    }
}
