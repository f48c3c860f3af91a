//! Single-frame extraction with ffmpeg.

use crate::runner::run_with_timeout;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Extracts still frames from videos, letterboxed to a fixed box.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl FrameExtractor {
    /// Create an extractor for the given ffmpeg binary. `timeout` bounds each
    /// attempt separately.
    pub fn new(ffmpeg: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }

    /// Extract one JPEG frame at `timestamp_secs` into `output`.
    ///
    /// Succeeds only when ffmpeg exits cleanly and leaves a non-empty file.
    pub async fn extract_frame(
        &self,
        input: &Path,
        output: &Path,
        timestamp_secs: u32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-v", "error", "-ss"])
            .arg(timestamp_secs.to_string())
            .arg("-i")
            .arg(input)
            .args(["-frames:v", "1", "-vf"])
            .arg(scale_filter(width, height))
            .args(["-q:v", "2", "-f", "image2", "-y"])
            .arg(output);

        let result = run_with_timeout(command, "ffmpeg", self.timeout).await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::tool_failed("ffmpeg", stderr.trim().to_string()));
        }

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(Error::tool_failed(
                "ffmpeg",
                format!("no frame written at {}s", timestamp_secs),
            )),
        }
    }

    /// Try each timestamp in order and stop at the first success.
    ///
    /// Returns the timestamp that produced the frame.
    pub async fn extract_first_frame(
        &self,
        input: &Path,
        output: &Path,
        timestamps: &[u32],
        width: u32,
        height: u32,
    ) -> Option<u32> {
        for &ts in timestamps {
            match self.extract_frame(input, output, ts, width, height).await {
                Ok(()) => return Some(ts),
                Err(Error::ToolNotFound { .. }) => {
                    tracing::debug!("ffmpeg not available, skipping frame extraction");
                    return None;
                }
                Err(e) => {
                    tracing::debug!(
                        input = %input.display(),
                        timestamp = ts,
                        error = %e,
                        "frame extraction attempt failed"
                    );
                }
            }
        }

        tracing::warn!(input = %input.display(), "no frame could be extracted");
        None
    }
}

/// Fit inside `width`x`height` preserving aspect ratio, then pad to exactly
/// that size with the image centred.
pub fn scale_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    )
}
