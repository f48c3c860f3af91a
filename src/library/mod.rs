//! The on-disk media library.
//!
//! The library is a root directory with one sub-directory per media type.
//! There is no index: lookups resolve paths directly and listings rescan.

mod folder_thumbnails;
mod scanner;
mod series;

pub use folder_thumbnails::{
    auto_thumbnail_candidate, registry_key, thumbnail_url, FolderThumbnail,
    FolderThumbnailRegistry,
};
pub use scanner::{count_folders, scan_media, FileEntry, FileLister, ScannedFile, WalkDirLister};
pub use series::{series_key, SeriesEntry, SeriesIndex, UNKNOWN_SERIES};

use std::path::PathBuf;
use std::sync::Arc;

use mediacast_common::{Error, MediaType, Result};

use crate::config::LibraryConfig;

/// Clean up a client-supplied relative path.
///
/// Backslashes count as separators; empty and `.` segments are dropped.
/// Any `..` segment is rejected.
pub fn normalize_relative_path(raw: &str) -> Result<String> {
    let mut parts = Vec::new();
    for part in raw.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => return Err(Error::invalid_input(format!("Path escapes media root: {}", raw))),
            part => parts.push(part),
        }
    }

    if parts.is_empty() {
        return Err(Error::invalid_input("Empty path"));
    }
    Ok(parts.join("/"))
}

/// Media library rooted at `library.root`.
#[derive(Clone)]
pub struct Library {
    config: LibraryConfig,
    lister: Arc<dyn FileLister>,
}

impl Library {
    pub fn new(config: LibraryConfig) -> Self {
        Self::with_lister(config, Arc::new(WalkDirLister))
    }

    pub fn with_lister(config: LibraryConfig, lister: Arc<dyn FileLister>) -> Self {
        Self { config, lister }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn media_dir(&self, media_type: MediaType) -> PathBuf {
        self.config.media_dir(media_type)
    }

    /// Find `relative` under the roots of `types`, trying them in order.
    ///
    /// Returns the absolute path, the root it was found under and the
    /// normalised relative path.
    pub fn locate(&self, relative: &str, types: &[MediaType]) -> Result<(PathBuf, MediaType, String)> {
        let relative = normalize_relative_path(relative)?;

        types
            .iter()
            .map(|&media_type| (self.media_dir(media_type).join(&relative), media_type))
            .find(|(path, _)| path.is_file())
            .map(|(path, media_type)| (path, media_type, relative.clone()))
            .ok_or_else(|| Error::not_found(relative.clone()))
    }

    /// Scan the root of `media_type`, optionally limited to `folder`.
    pub async fn scan(&self, media_type: MediaType, folder: Option<&str>) -> Result<Vec<ScannedFile>> {
        let lister = Arc::clone(&self.lister);
        let root = self.media_dir(media_type);
        let limits = self.config.size_limits.clone();
        let folder = folder.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            scan_media(lister.as_ref(), &root, folder.as_deref(), &limits)
        })
        .await
        .map_err(|e| Error::internal(format!("Scan task failed: {}", e)))
    }

    /// Directories at any depth under the root of `media_type`.
    pub async fn count_folders(&self, media_type: MediaType) -> Result<usize> {
        let root = self.media_dir(media_type);
        tokio::task::spawn_blocking(move || count_folders(&root))
            .await
            .map_err(|e| Error::internal(format!("Scan task failed: {}", e)))
    }
}
