//! External tool invocation with a deadline.
//!
//! Every ffmpeg/ffprobe call goes through [`run_tool`]: the child is spawned with
//! `kill_on_drop`, its output is drained on separate tasks, and the wait is bounded by a
//! timeout. A timed-out child is killed when the handle drops.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Maximum stdout or stderr captured per stream (4 MiB).
const MAX_OUTPUT_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool path: {0}")]
    InvalidPath(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {elapsed_ms} ms")]
    Timeout { program: String, elapsed_ms: u64 },
}

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration_ms: u64,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Combined stdout and stderr, lossily decoded.
    pub fn diagnostics(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }
}

/// Reject tool paths carrying shell metacharacters or traversal.
pub fn validate_tool_path(path: &str) -> Result<(), ToolError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty()
        || path.contains("..")
        || path.chars().any(|c| dangerous_chars.contains(&c))
    {
        return Err(ToolError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Run `cmd` to completion or until `timeout` elapses.
pub async fn run_tool(
    cmd: &mut Command,
    program: &str,
    timeout: Duration,
) -> Result<ToolOutput, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => Ok(ToolOutput {
            status,
            stdout: stdout_task.await.unwrap_or_default(),
            stderr: stderr_task.await.unwrap_or_default(),
            duration_ms: start.elapsed().as_millis() as u64,
        }),
        Ok(Err(source)) => Err(ToolError::Wait {
            program: program.to_string(),
            source,
        }),
        Err(_elapsed) => {
            // `child` drops here and is killed.
            Err(ToolError::Timeout {
                program: program.to_string(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            })
        }
    }
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tool_path() {
        assert!(validate_tool_path("ffmpeg").is_ok());
        assert!(validate_tool_path("/usr/local/bin/ffprobe").is_ok());
        assert!(validate_tool_path("ffmpeg; rm -rf /").is_err());
        assert!(validate_tool_path("../bin/ffmpeg").is_err());
        assert!(validate_tool_path("").is_err());
    }

    #[tokio::test]
    async fn test_run_tool_captures_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2"]);
        let output = run_tool(&mut cmd, "sh", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
        assert!(output.diagnostics().contains("err"));
    }

    #[tokio::test]
    async fn test_run_tool_reports_exit_status() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 3"]);
        let output = run_tool(&mut cmd, "sh", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_run_tool_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = run_tool(&mut cmd, "sleep", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary() {
        let mut cmd = Command::new("/nonexistent/tubely-tool");
        let err = run_tool(&mut cmd, "tubely-tool", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
