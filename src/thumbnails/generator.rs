//! Thumbnail rendering for images and videos.
//!
//! Thumbnails are JPEGs named after a hash of the source's absolute path, so
//! the same file always maps to the same thumbnail. Output is written to a
//! temporary file in the thumbnail directory and renamed into place.

use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};
use mediacast_av::FrameExtractor;
use mediacast_common::MediaType;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::config::{ThumbnailConfig, ToolsConfig};

const ID_SUFFIX: &str = ".jpg";
/// Hex characters in an id: the first 16 bytes of the SHA-256.
const ID_HEX_LEN: usize = 32;

/// Deterministic thumbnail id for a source file.
pub fn thumbnail_id(source: &Path) -> String {
    let absolute = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
    let digest = Sha256::digest(absolute.to_string_lossy().as_bytes());
    format!("{}{}", hex::encode(&digest[..ID_HEX_LEN / 2]), ID_SUFFIX)
}

/// Whether `id` names a servable file in the thumbnail directory.
///
/// Generated ids and uploaded folder images both qualify: a single path
/// segment ending in `.jpg` that is not hidden.
pub fn is_valid_thumbnail_id(id: &str) -> bool {
    id.strip_suffix(ID_SUFFIX).is_some_and(|stem| {
        !stem.is_empty()
            && !id.starts_with('.')
            && !id.contains("..")
            && !id.contains(['/', '\\', '\0'])
    })
}

/// Renders thumbnails into a directory.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    dir: PathBuf,
    width: u32,
    height: u32,
    jpeg_quality: u8,
    video_timestamps: Vec<u32>,
    extractor: FrameExtractor,
}

impl ThumbnailGenerator {
    pub fn new(config: &ThumbnailConfig, tools: &ToolsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            width: config.width,
            height: config.height,
            jpeg_quality: config.jpeg_quality,
            video_timestamps: config.video_timestamps.clone(),
            extractor: FrameExtractor::new(tools.ffmpeg(), tools.timeout()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// On-disk location for an id.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    /// Whether a finished thumbnail exists for `id`.
    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }

    /// Names of the finished `.jpg` files in the thumbnail directory.
    ///
    /// In-progress temporary files are dot-prefixed and never listed.
    pub fn stored_ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(ID_SUFFIX) && !name.starts_with('.'))
            .collect()
    }

    /// Delete every stored thumbnail whose id is not in `keep`.
    pub fn remove_orphans(&self, keep: &HashSet<String>) -> usize {
        let mut removed = 0;
        for id in self.stored_ids() {
            if keep.contains(&id) {
                continue;
            }
            match std::fs::remove_file(self.path_for(&id)) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(id, "Failed to remove orphaned thumbnail: {}", e),
            }
        }
        if removed > 0 {
            tracing::info!(removed, "Removed orphaned thumbnails");
        }
        removed
    }

    /// Render the thumbnail for `source` under `id`.
    ///
    /// Returns `false` when the media type has no thumbnails or rendering
    /// failed; failures are logged, never propagated.
    pub async fn generate(&self, source: &Path, media_type: MediaType, id: &str) -> bool {
        let result = match media_type {
            MediaType::Image => self.generate_image(source, id).await,
            MediaType::Video => self.generate_video(source, id).await,
            _ => return false,
        };

        match result {
            Ok(true) => {
                tracing::debug!(source = %source.display(), id, "Generated thumbnail");
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!(source = %source.display(), "Thumbnail generation failed: {:#}", e);
                false
            }
        }
    }

    fn temp_file(&self, id: &str) -> Result<NamedTempFile> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create thumbnail directory: {}", self.dir.display())
        })?;
        tempfile::Builder::new()
            .prefix(&format!(".{}.", id))
            .suffix(ID_SUFFIX)
            .tempfile_in(&self.dir)
            .context("Failed to create temporary thumbnail file")
    }

    async fn generate_image(&self, source: &Path, id: &str) -> Result<bool> {
        let temp = self.temp_file(id)?;
        let dest = self.path_for(id);
        let source = source.to_path_buf();
        let (width, height, quality) = (self.width, self.height, self.jpeg_quality);

        tokio::task::spawn_blocking(move || -> Result<bool> {
            render_image(&source, temp.as_file(), width, height, quality)?;
            temp.persist(&dest)
                .with_context(|| format!("Failed to move thumbnail into {}", dest.display()))?;
            Ok(true)
        })
        .await
        .context("Thumbnail task panicked")?
    }

    async fn generate_video(&self, source: &Path, id: &str) -> Result<bool> {
        let temp = self.temp_file(id)?;

        let Some(timestamp) = self
            .extractor
            .extract_first_frame(
                source,
                temp.path(),
                &self.video_timestamps,
                self.width,
                self.height,
            )
            .await
        else {
            return Ok(false);
        };

        let dest = self.path_for(id);
        temp.persist(&dest)
            .with_context(|| format!("Failed to move thumbnail into {}", dest.display()))?;
        tracing::trace!(timestamp, "Video frame extracted");
        Ok(true)
    }
}

/// Decode, orient, shrink to fit and encode as JPEG into `out`.
fn render_image(
    source: &Path,
    out: &std::fs::File,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<()> {
    let mut decoder = ImageReader::open(source)
        .with_context(|| format!("Failed to open image: {}", source.display()))?
        .with_guessed_format()
        .context("Failed to detect image format")?
        .into_decoder()
        .context("Unsupported image format")?;
    let orientation = decoder.orientation().context("Failed to read orientation")?;
    let mut img = DynamicImage::from_decoder(decoder).context("Failed to decode image")?;
    img.apply_orientation(orientation);

    // Never upscale.
    if img.width() > width || img.height() > height {
        img = img.resize(width, height, FilterType::Lanczos3);
    }

    let mut writer = BufWriter::new(out);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .context("Failed to encode JPEG")?;
    writer.flush().context("Failed to write thumbnail")?;
    Ok(())
}
