//! Core type definitions for scanned media.
//!
//! All enums are serialized in lowercase to match the API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label used for files that sit directly in a media root.
pub const ROOT_FOLDER_LABEL: &str = "Root";

/// Category of a media file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still images.
    Image,
    /// Video files.
    Video,
    /// Audio files.
    Audio,
    /// Office documents, text and PDFs.
    Document,
    /// Source code and markup.
    Code,
    /// Compressed archives.
    Archive,
}

impl MediaType {
    /// Every media type, in media-root lookup order.
    pub const ALL: [MediaType; 6] = [
        MediaType::Image,
        MediaType::Video,
        MediaType::Audio,
        MediaType::Document,
        MediaType::Code,
        MediaType::Archive,
    ];

    /// Lowercase name used in URLs, registry keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Code => "code",
            Self::Archive => "archive",
        }
    }

    /// Whether files of this type get a generated preview image.
    pub fn has_thumbnail(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "document" => Ok(Self::Document),
            "code" => Ok(Self::Code),
            "archive" => Ok(Self::Archive),
            _ => Err(format!("Unknown media type: {}", s)),
        }
    }
}

/// One scanned file.
///
/// Built fresh on every directory scan and never mutated afterwards; the
/// scan/response cycle that created it owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// File name including extension.
    pub filename: String,
    /// Path relative to the media root, forward-slash separated.
    pub relative_path: String,
    /// Parent path relative to the media root; empty at the root.
    pub folder: String,
    /// Media category.
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Size on disk in bytes.
    pub size_bytes: u64,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
    /// Thumbnail id, when one exists.
    pub thumbnail_ref: Option<String>,
}

impl MediaRecord {
    /// Folder name for display and registry lookups (`"Root"` at the top).
    pub fn folder_label(&self) -> &str {
        if self.folder.is_empty() {
            ROOT_FOLDER_LABEL
        } else {
            &self.folder
        }
    }

    /// Whether this record is a video.
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(folder: &str) -> MediaRecord {
        MediaRecord {
            filename: "e1.mp4".to_string(),
            relative_path: if folder.is_empty() {
                "e1.mp4".to_string()
            } else {
                format!("{}/e1.mp4", folder)
            },
            folder: folder.to_string(),
            media_type: MediaType::Video,
            size_bytes: 10,
            modified_at: Utc::now(),
            thumbnail_ref: None,
        }
    }

    #[test]
    fn test_media_type_round_trip_str() {
        for media_type in MediaType::ALL {
            assert_eq!(media_type.as_str().parse::<MediaType>(), Ok(media_type));
        }
        assert_eq!("VIDEO".parse::<MediaType>(), Ok(MediaType::Video));
        assert!("movie".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_media_type_serde_lowercase() {
        let json = serde_json::to_string(&MediaType::Document).unwrap();
        assert_eq!(json, "\"document\"");
    }

    #[test]
    fn test_has_thumbnail() {
        assert!(MediaType::Image.has_thumbnail());
        assert!(MediaType::Video.has_thumbnail());
        assert!(!MediaType::Audio.has_thumbnail());
        assert!(!MediaType::Archive.has_thumbnail());
    }

    #[test]
    fn test_folder_label() {
        assert_eq!(record("").folder_label(), "Root");
        assert_eq!(record("Shows/Lost").folder_label(), "Shows/Lost");
    }

    #[test]
    fn test_record_serializes_type_field() {
        let value = serde_json::to_value(record("Shows")).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["relative_path"], "Shows/e1.mp4");
        assert!(value["thumbnail_ref"].is_null());
    }
}
