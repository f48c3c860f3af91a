//! Path utilities for detecting media types by extension.
//!
//! The extension tables here decide which files a scan lists at all and
//! which media type each one is filed under.

use std::path::Path;

use crate::types::MediaType;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "svg"];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "ogv",
];

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma", "opus"];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf", "md", "csv", "odt", "ods",
    "odp",
];

const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "html", "css", "json", "xml", "yaml", "yml", "sh", "php", "java", "cpp", "h",
    "sql",
];

const ARCHIVE_EXTENSIONS: &[&str] = &[
    "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "tgz", "tbz2", "txz",
];

/// Get the extension list for a media type.
///
/// # Examples
///
/// ```
/// use mediacast_common::{paths::extensions_for, MediaType};
///
/// assert!(extensions_for(MediaType::Video).contains(&"mkv"));
/// assert!(extensions_for(MediaType::Archive).contains(&"7z"));
/// ```
#[must_use]
pub fn extensions_for(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Image => IMAGE_EXTENSIONS,
        MediaType::Video => VIDEO_EXTENSIONS,
        MediaType::Audio => AUDIO_EXTENSIONS,
        MediaType::Document => DOCUMENT_EXTENSIONS,
        MediaType::Code => CODE_EXTENSIONS,
        MediaType::Archive => ARCHIVE_EXTENSIONS,
    }
}

/// Lowercased extension of a path, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Detect the media type of a path from its extension.
///
/// Returns `None` for files whose extension is not in any table; those
/// files are not part of the library.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediacast_common::{paths::media_type_of, MediaType};
///
/// assert_eq!(media_type_of(Path::new("photo.JPG")), Some(MediaType::Image));
/// assert_eq!(media_type_of(Path::new("notes")), None);
/// ```
pub fn media_type_of(path: &Path) -> Option<MediaType> {
    let ext = extension_of(path)?;
    MediaType::ALL
        .into_iter()
        .find(|media_type| extensions_for(*media_type).contains(&ext.as_str()))
}

/// Check if a path has a video file extension.
pub fn is_video_file(path: &Path) -> bool {
    media_type_of(path) == Some(MediaType::Video)
}

/// Check if a path has an image file extension.
pub fn is_image_file(path: &Path) -> bool {
    media_type_of(path) == Some(MediaType::Image)
}
