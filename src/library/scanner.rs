//! Directory scanning.
//!
//! A [`FileLister`] yields the regular files under a media root; the scan
//! keeps those with a known media extension and stats them into
//! [`ScannedFile`]s. Nothing is cached: every scan walks the tree again.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use mediacast_common::{paths::media_type_of, MediaRecord, MediaType};
use mediacast_parser::NaturalKey;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::SizeLimits;

/// A regular file found under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Path relative to the listed root, `/`-separated.
    pub relative_path: String,
}

/// Source of file listings.
///
/// Every call to [`FileLister::list`] starts a fresh traversal.
pub trait FileLister: Send + Sync {
    fn list(&self, root: &Path) -> Box<dyn Iterator<Item = FileEntry> + Send>;
}

/// Recursive listing backed by `walkdir`, following symlinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkDirLister;

impl FileLister for WalkDirLister {
    fn list(&self, root: &Path) -> Box<dyn Iterator<Item = FileEntry> + Send> {
        let root = root.to_path_buf();
        let walk = WalkDir::new(root.clone()).follow_links(true).into_iter();

        Box::new(
            walk.filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| {
                let relative = entry.path().strip_prefix(&root).ok()?;
                Some(FileEntry {
                    relative_path: to_slash_path(relative),
                    path: entry.into_path(),
                })
            }),
        )
    }
}

/// Join the normal components of `path` with `/`.
pub(crate) fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A media file found by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub filename: String,
    pub relative_path: String,
    pub folder: String,
    pub media_type: MediaType,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

impl ScannedFile {
    pub fn into_record(self, thumbnail_ref: Option<String>) -> MediaRecord {
        MediaRecord {
            filename: self.filename,
            relative_path: self.relative_path,
            folder: self.folder,
            media_type: self.media_type,
            size_bytes: self.size_bytes,
            modified_at: self.modified_at,
            thumbnail_ref,
        }
    }
}

/// Whether `relative_path` lies in `folder` or one of its sub-folders.
fn in_folder(relative_path: &str, folder: &str) -> bool {
    relative_path
        .strip_prefix(folder)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Number of directories below `root` at any depth. A missing root has none.
pub fn count_folders(root: &Path) -> usize {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .count()
}

/// Scan `root` for media files.
///
/// Files with unknown extensions are skipped. `folder` limits the scan to
/// a subtree (empty means everything). Results are in natural filename
/// order; files over their size ceiling are kept but logged.
pub fn scan_media(
    lister: &dyn FileLister,
    root: &Path,
    folder: Option<&str>,
    limits: &SizeLimits,
) -> Vec<ScannedFile> {
    let folder = folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty());

    let mut files: Vec<ScannedFile> = lister
        .list(root)
        .filter(|entry| folder.map_or(true, |f| in_folder(&entry.relative_path, f)))
        .filter_map(|entry| {
            let media_type = media_type_of(&entry.path)?;
            let metadata = match std::fs::metadata(&entry.path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!(path = %entry.path.display(), "Failed to stat file: {}", e);
                    return None;
                }
            };

            let size_bytes = metadata.len();
            let limit = limits.limit_for(media_type);
            if size_bytes > limit {
                warn!(
                    path = %entry.relative_path,
                    size_bytes,
                    limit,
                    "File exceeds the {} size limit",
                    media_type
                );
            }

            let (folder, filename) = match entry.relative_path.rsplit_once('/') {
                Some((folder, filename)) => (folder.to_string(), filename.to_string()),
                None => (String::new(), entry.relative_path.clone()),
            };
            let modified_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_default();

            Some(ScannedFile {
                path: entry.path,
                filename,
                relative_path: entry.relative_path,
                folder,
                media_type,
                size_bytes,
                modified_at,
            })
        })
        .collect();

    files.sort_by_cached_key(|file| NaturalKey::new(&file.filename));
    debug!(root = %root.display(), count = files.len(), "Scanned media directory");
    files
}
