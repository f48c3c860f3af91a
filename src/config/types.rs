use mediacast_av::CompatibilityRules;
use mediacast_common::MediaType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Direct-play allow-lists for browsers.
    #[serde(default)]
    pub playback: CompatibilityRules,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub jellyfin: JellyfinConfig,

    #[serde(default)]
    pub folder_thumbnails: FolderThumbnailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Enable authentication for API and streaming
    #[serde(default)]
    pub enabled: bool,

    /// API key for programmatic access (used with Authorization: Bearer header)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Username for web UI login
    #[serde(default)]
    pub username: Option<String>,

    /// Bcrypt hash of the password (generate with `mediacast hash-password`)
    #[serde(default)]
    pub password_hash: Option<String>,

    /// Session timeout in hours (default: 168)
    #[serde(default = "default_session_timeout")]
    pub session_timeout_hours: u64,

    /// Key used to sign session cookies. A random key is generated at
    /// startup when unset, which logs everyone out on restart.
    #[serde(default)]
    pub session_secret: Option<String>,
}

fn default_session_timeout() -> u64 {
    24 * 7
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            username: None,
            password_hash: None,
            session_timeout_hours: default_session_timeout(),
            session_secret: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Directory holding one sub-directory per media type.
    #[serde(default = "default_library_root")]
    pub root: PathBuf,

    #[serde(default)]
    pub folders: LibraryFolders,

    #[serde(default)]
    pub size_limits: SizeLimits,
}

fn default_library_root() -> PathBuf {
    PathBuf::from("/mnt/media")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_library_root(),
            folders: LibraryFolders::default(),
            size_limits: SizeLimits::default(),
        }
    }
}

impl LibraryConfig {
    /// Media root for a type, e.g. `/mnt/media/Movies` for videos.
    pub fn media_dir(&self, media_type: MediaType) -> PathBuf {
        let root = shellexpand::tilde(&self.root.to_string_lossy()).into_owned();
        Path::new(&root).join(self.folders.name_for(media_type))
    }
}

/// Sub-directory name per media type.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibraryFolders {
    pub image: String,
    pub video: String,
    pub audio: String,
    pub document: String,
    pub code: String,
    pub archive: String,
}

impl Default for LibraryFolders {
    fn default() -> Self {
        Self {
            image: "Pictures".to_string(),
            video: "Movies".to_string(),
            audio: "Music".to_string(),
            document: "Documents".to_string(),
            code: "Code".to_string(),
            archive: "Archives".to_string(),
        }
    }
}

impl LibraryFolders {
    pub fn name_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Image => &self.image,
            MediaType::Video => &self.video,
            MediaType::Audio => &self.audio,
            MediaType::Document => &self.document,
            MediaType::Code => &self.code,
            MediaType::Archive => &self.archive,
        }
    }
}

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Size ceilings in bytes. Files above their ceiling are still served but
/// logged during scans.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SizeLimits {
    pub image: u64,
    pub video: u64,
    pub audio: u64,
    pub document: u64,
    pub code: u64,
    pub archive: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            image: 100 * MIB,
            video: 10 * GIB,
            audio: 500 * MIB,
            document: 5 * GIB,
            code: GIB,
            archive: GIB,
        }
    }
}

impl SizeLimits {
    pub fn limit_for(&self, media_type: MediaType) -> u64 {
        match media_type {
            MediaType::Image => self.image,
            MediaType::Video => self.video,
            MediaType::Audio => self.audio,
            MediaType::Document => self.document,
            MediaType::Code => self.code,
            MediaType::Archive => self.archive,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumbnail_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_thumbnail_edge")]
    pub width: u32,

    #[serde(default = "default_thumbnail_edge")]
    pub height: u32,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Seconds into a video to try, in order, when grabbing a frame.
    #[serde(default = "default_video_timestamps")]
    pub video_timestamps: Vec<u32>,
}

fn default_thumbnail_dir() -> PathBuf {
    PathBuf::from("./data/thumbnails")
}
fn default_thumbnail_edge() -> u32 {
    300
}
fn default_jpeg_quality() -> u8 {
    85
}
fn default_video_timestamps() -> Vec<u32> {
    vec![5, 1, 10, 30]
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            dir: default_thumbnail_dir(),
            width: default_thumbnail_edge(),
            height: default_thumbnail_edge(),
            jpeg_quality: default_jpeg_quality(),
            video_timestamps: default_video_timestamps(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Upper bound on the size of each body chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_chunk_size() -> usize {
    32 * 1024
}
fn default_token_ttl() -> u64 {
    3600
}
fn default_sweep_interval() -> u64 {
    300
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            token_ttl_secs: default_token_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Per-invocation limit for ffmpeg and ffprobe.
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

impl ToolsConfig {
    pub fn ffmpeg(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }

    pub fn ffprobe(&self) -> PathBuf {
        self.ffprobe_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffprobe"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JellyfinConfig {
    #[serde(default = "default_jellyfin_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub enabled: bool,
}

fn default_jellyfin_url() -> String {
    "http://localhost:8096".to_string()
}

impl Default for JellyfinConfig {
    fn default() -> Self {
        Self {
            url: default_jellyfin_url(),
            api_key: String::new(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderThumbnailConfig {
    /// JSON file mapping `<type>/<folder>` to a thumbnail reference.
    #[serde(default = "default_registry_path")]
    pub registry: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("folder_thumbnails.json")
}

impl Default for FolderThumbnailConfig {
    fn default() -> Self {
        Self {
            registry: default_registry_path(),
        }
    }
}
