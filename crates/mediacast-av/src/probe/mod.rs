//! Media probing via the ffprobe CLI.
//!
//! [`Prober::probe`] returns a typed error; [`Prober::probe_opt`] folds every
//! failure into `None` after logging it, which is what request handlers use.

mod ffprobe;

pub use ffprobe::parse_ffprobe_json;

use crate::runner::run_with_timeout;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Summary of a video file as reported by ffprobe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoProbe {
    /// Container format name list, e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`.
    pub container_format: String,
    /// Codec of the first video stream.
    pub video_codec: Option<String>,
    /// Codec of the first audio stream. `None` means the file has no audio.
    pub audio_codec: Option<String>,
    /// Duration in seconds, `0.0` when unknown.
    pub duration_seconds: f64,
    /// Size in bytes as reported by the container.
    pub size_bytes: u64,
    /// Width of the first video stream.
    pub width: Option<u32>,
    /// Height of the first video stream.
    pub height: Option<u32>,
    /// Overall bit rate in bits per second.
    pub bit_rate: Option<u64>,
}

/// Runs ffprobe with a configured binary and timeout.
#[derive(Debug, Clone)]
pub struct Prober {
    ffprobe: PathBuf,
    timeout: Duration,
}

impl Prober {
    /// Create a prober for the given ffprobe binary.
    pub fn new(ffprobe: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            timeout,
        }
    }

    /// Probe a file.
    pub async fn probe(&self, path: &Path) -> Result<VideoProbe> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }

        let mut command = Command::new(&self.ffprobe);
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path);

        let output = run_with_timeout(command, "ffprobe", self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tool_failed("ffprobe", stderr.trim().to_string()));
        }

        let json = String::from_utf8(output.stdout)
            .map_err(|e| Error::parse_error("ffprobe", format!("Invalid UTF-8: {}", e)))?;

        parse_ffprobe_json(&json)
    }

    /// Probe a file, returning `None` on any failure.
    pub async fn probe_opt(&self, path: &Path) -> Option<VideoProbe> {
        match self.probe(path).await {
            Ok(probe) => Some(probe),
            Err(Error::ToolNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "ffprobe not available, skipping probe");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "probe failed");
                None
            }
        }
    }
}
