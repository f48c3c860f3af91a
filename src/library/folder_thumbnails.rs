//! Folder thumbnails.
//!
//! Custom folder images live in a JSON registry keyed by
//! `<type>/<folder>` (`<type>/Root` for a media root). Older registries store
//! a bare reference string; newer ones store an object that can also pass
//! the image down to sub-folders. Uploaded images are stored in the
//! thumbnail directory and referenced as `/thumbnail/<file>`. The registry is
//! read on every lookup, so edits by other tools show up immediately.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use mediacast_common::{paths::media_type_of, MediaType, ROOT_FOLDER_LABEL};
use serde::Deserialize;

/// Registry entry as stored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RegistryEntry {
    Legacy(String),
    Structured {
        #[serde(default)]
        thumbnail_url: Option<String>,
        #[serde(default)]
        thumbnail_filename: Option<String>,
        #[serde(default)]
        inherit_to_children: bool,
    },
}

/// Path prefix under which stored thumbnails are served.
const THUMBNAIL_ROUTE: &str = "/thumbnail/";

/// A folder thumbnail after migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderThumbnail {
    /// An absolute `http(s)` URL, a server path, or a thumbnail file name.
    pub thumbnail_ref: String,
    pub inherit_to_children: bool,
}

impl FolderThumbnail {
    /// Name of the file in the thumbnail directory this entry points at.
    pub fn stored_file(&self) -> Option<&str> {
        let name = match self.thumbnail_ref.strip_prefix(THUMBNAIL_ROUTE) {
            Some(name) => name,
            None if is_absolute_ref(&self.thumbnail_ref) => return None,
            None => self.thumbnail_ref.as_str(),
        };
        Some(name).filter(|name| !name.is_empty() && !name.contains('/'))
    }
}

impl RegistryEntry {
    /// Entries with neither a URL nor a file name are dropped.
    fn migrate(self) -> Option<FolderThumbnail> {
        match self {
            Self::Legacy(thumbnail_ref) => Some(FolderThumbnail {
                thumbnail_ref,
                inherit_to_children: false,
            }),
            Self::Structured {
                thumbnail_url,
                thumbnail_filename,
                inherit_to_children,
            } => {
                let thumbnail_ref = thumbnail_url
                    .filter(|url| !url.is_empty())
                    .or_else(|| thumbnail_filename.filter(|name| !name.is_empty()))?;
                Some(FolderThumbnail {
                    thumbnail_ref,
                    inherit_to_children,
                })
            }
        }
    }
}

fn is_absolute_ref(thumbnail_ref: &str) -> bool {
    thumbnail_ref.starts_with('/')
        || thumbnail_ref.starts_with("http://")
        || thumbnail_ref.starts_with("https://")
}

/// Normalise a folder argument: empty and `"Root"` both mean the media root.
fn normalize_folder(folder: &str) -> &str {
    let folder = folder.trim_matches('/');
    if folder == ROOT_FOLDER_LABEL {
        ""
    } else {
        folder
    }
}

/// Registry key for a folder.
pub fn registry_key(media_type: MediaType, folder: &str) -> String {
    match normalize_folder(folder) {
        "" => format!("{}/{}", media_type, ROOT_FOLDER_LABEL),
        folder => format!("{}/{}", media_type, folder),
    }
}

/// URL a client can load for a thumbnail reference.
pub fn thumbnail_url(thumbnail_ref: &str) -> String {
    if is_absolute_ref(thumbnail_ref) {
        thumbnail_ref.to_string()
    } else {
        format!("{}{}", THUMBNAIL_ROUTE, thumbnail_ref)
    }
}

/// Read-only view of the registry file.
#[derive(Debug, Clone)]
pub struct FolderThumbnailRegistry {
    path: PathBuf,
}

impl FolderThumbnailRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load every entry. A missing or unreadable registry is empty.
    pub fn load(&self) -> HashMap<String, FolderThumbnail> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read folder thumbnail registry {:?}: {}", self.path, e);
                return HashMap::new();
            }
        };

        match serde_json::from_str::<HashMap<String, RegistryEntry>>(&content) {
            Ok(entries) => entries
                .into_iter()
                .filter_map(|(key, entry)| Some((key, entry.migrate()?)))
                .collect(),
            Err(e) => {
                tracing::warn!("Ignoring corrupt folder thumbnail registry {:?}: {}", self.path, e);
                HashMap::new()
            }
        }
    }

    /// Thumbnail files the registry refers to.
    pub fn stored_files(&self) -> HashSet<String> {
        self.load()
            .values()
            .filter_map(FolderThumbnail::stored_file)
            .map(str::to_string)
            .collect()
    }

    /// Configured thumbnail for a folder: its own entry, or the nearest
    /// ancestor entry that is inherited by children.
    pub fn lookup(&self, media_type: MediaType, folder: &str) -> Option<String> {
        let entries = self.load();
        let folder = normalize_folder(folder);

        if let Some(entry) = entries.get(&registry_key(media_type, folder)) {
            return Some(entry.thumbnail_ref.clone());
        }
        if folder.is_empty() {
            return None;
        }

        let mut ancestor = folder;
        loop {
            ancestor = ancestor.rsplit_once('/').map_or("", |(parent, _)| parent);
            if let Some(entry) = entries.get(&registry_key(media_type, ancestor)) {
                if entry.inherit_to_children {
                    return Some(entry.thumbnail_ref.clone());
                }
            }
            if ancestor.is_empty() {
                return None;
            }
        }
    }
}

/// File whose thumbnail stands in for a folder without a configured one.
///
/// Only direct children are considered: images before videos, then by
/// case-insensitive name.
pub fn auto_thumbnail_candidate(dir: &Path) -> Option<(PathBuf, MediaType)> {
    let entries = std::fs::read_dir(dir).ok()?;

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let media_type = media_type_of(&path).filter(MediaType::has_thumbnail)?;
            let name = path.file_name()?.to_string_lossy().to_lowercase();
            Some((media_type != MediaType::Image, name, path, media_type))
        })
        .min_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)))
        .map(|(_, _, path, media_type)| (path, media_type))
}
