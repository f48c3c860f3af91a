//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which lays out a throwaway media root with one
//! directory per media type, a private thumbnail cache and a full
//! [`AppContext`]. The [`TestHarness::with_server`] constructor starts Axum
//! on a random port for HTTP-level testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use tempfile::TempDir;

use mediacast::config::Config;
use mediacast::server::{create_router, AppContext};

/// Folder names used by the default configuration.
pub const VIDEO_DIR: &str = "Movies";
pub const IMAGE_DIR: &str = "Pictures";
pub const AUDIO_DIR: &str = "Music";

/// Test harness wrapping a fully-constructed [`AppContext`] over a
/// temporary media tree.
pub struct TestHarness {
    pub ctx: AppContext,
    pub root: TempDir,
    pub data: TempDir,
}

/// Default configuration rooted at `root`, with external tools pointing
/// at binaries that do not exist.
pub fn test_config(root: &Path, data: &Path) -> Config {
    let mut config = Config::default();
    config.library.root = root.to_path_buf();
    config.thumbnails.dir = data.join("thumbnails");
    config.folder_thumbnails.registry = data.join("folder_thumbnails.json");
    config.tools.ffmpeg_path = Some(PathBuf::from("nonexistent_ffmpeg_for_tests"));
    config.tools.ffprobe_path = Some(PathBuf::from("nonexistent_ffprobe_for_tests"));
    config.tools.timeout_secs = 5;
    config
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a new harness, letting `customize` adjust the configuration.
    pub fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().expect("failed to create media root");
        let data = tempfile::tempdir().expect("failed to create data dir");

        let mut config = test_config(root.path(), data.path());
        customize(&mut config);

        for folder in [VIDEO_DIR, IMAGE_DIR, AUDIO_DIR] {
            std::fs::create_dir_all(root.path().join(folder)).expect("failed to create folder");
        }

        let ctx = AppContext::new(config);
        Self { ctx, root, data }
    }

    /// Router over this harness' context.
    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    /// Write `contents` under the media root, creating parent folders.
    pub fn write_file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent");
        }
        std::fs::write(&path, contents).expect("failed to write media file");
        path
    }

    /// Write a small solid-colour PNG under the media root.
    pub fn write_png(&self, relative: &str, width: u32, height: u32) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent");
        }
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]))
            .save(&path)
            .expect("failed to write png");
        path
    }

    /// Thumbnail cache directory.
    pub fn thumbnail_dir(&self) -> PathBuf {
        self.ctx.config.thumbnails.dir.clone()
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start an Axum server with a customised config on a random port.
    pub async fn with_server_config(customize: impl FnOnce(&mut Config)) -> (Self, SocketAddr) {
        Self::with_config(customize).serve().await
    }

    /// Serve this harness on a random port.
    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }
}

/// Enable authentication with a fixed API key and login.
pub fn enable_auth(config: &mut Config, password: &str) {
    let auth = &mut config.server.auth;
    auth.enabled = true;
    auth.api_key = Some("test-api-key".to_string());
    auth.username = Some("viewer".to_string());
    auth.password_hash = Some(bcrypt::hash(password, 4).expect("bcrypt hash"));
    auth.session_secret = Some("integration-test-secret".to_string());
}
