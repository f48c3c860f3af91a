//! Coalesced thumbnail generation.
//!
//! Concurrent requests for the same thumbnail share one generation task.
//! The first caller spawns it and registers a shared handle; later callers
//! await that handle. The task removes its own entry when it finishes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use mediacast_common::MediaType;
use parking_lot::Mutex;

use super::generator::{thumbnail_id, ThumbnailGenerator};

type Pending = Shared<BoxFuture<'static, Option<String>>>;

/// Thumbnail front-end shared by all request handlers.
#[derive(Clone)]
pub struct ThumbnailService {
    generator: Arc<ThumbnailGenerator>,
    in_flight: Arc<Mutex<HashMap<String, Pending>>>,
}

impl ThumbnailService {
    pub fn new(generator: ThumbnailGenerator) -> Self {
        Self {
            generator: Arc::new(generator),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn generator(&self) -> &ThumbnailGenerator {
        &self.generator
    }

    /// Make sure a thumbnail exists for `source`, generating it if needed.
    ///
    /// Returns the thumbnail id, or `None` when the type has no thumbnails
    /// or generation failed.
    pub async fn ensure(&self, source: &Path, media_type: MediaType) -> Option<String> {
        self.run(source, media_type, false).await
    }

    /// Render the thumbnail again even if one exists.
    pub async fn regenerate(&self, source: &Path, media_type: MediaType) -> Option<String> {
        self.run(source, media_type, true).await
    }

    /// Number of generations currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    async fn run(&self, source: &Path, media_type: MediaType, force: bool) -> Option<String> {
        if !media_type.has_thumbnail() {
            return None;
        }

        let id = thumbnail_id(source);
        if !force && self.generator.exists(&id) {
            return Some(id);
        }

        let pending = {
            let mut in_flight = self.in_flight.lock();
            if let Some(pending) = in_flight.get(&id) {
                tracing::trace!(id, "Joining in-flight thumbnail generation");
                pending.clone()
            } else {
                // The map stays locked until the entry is inserted, so the
                // task cannot remove it first.
                let pending = self.spawn_generation(source, media_type, id.clone(), force);
                in_flight.insert(id, pending.clone());
                pending
            }
        };

        pending.await
    }

    fn spawn_generation(
        &self,
        source: &Path,
        media_type: MediaType,
        id: String,
        force: bool,
    ) -> Pending {
        let generator = Arc::clone(&self.generator);
        let in_flight = Arc::clone(&self.in_flight);
        let source = source.to_path_buf();

        let handle = tokio::spawn(async move {
            // Another task may have finished it between our check and now.
            let done = (!force && generator.exists(&id))
                || generator.generate(&source, media_type, &id).await;
            in_flight.lock().remove(&id);
            done.then_some(id)
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Thumbnail task failed: {}", e);
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ThumbnailConfig, ToolsConfig};
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn service(thumbs: &Path, ffmpeg: PathBuf) -> ThumbnailService {
        let config = ThumbnailConfig {
            dir: thumbs.to_path_buf(),
            ..Default::default()
        };
        let tools = ToolsConfig {
            ffmpeg_path: Some(ffmpeg),
            ..Default::default()
        };
        ThumbnailService::new(ThumbnailGenerator::new(&config, &tools))
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let media = tempfile::tempdir().unwrap();
        let thumbs = tempfile::tempdir().unwrap();
        let source = media.path().join("photo.png");
        RgbImage::from_pixel(600, 600, Rgb([1, 2, 3])).save(&source).unwrap();

        let svc = service(thumbs.path(), PathBuf::from("nonexistent_ffmpeg_12345"));
        let first = svc.ensure(&source, MediaType::Image).await.unwrap();
        let modified = std::fs::metadata(svc.generator().path_for(&first))
            .unwrap()
            .modified()
            .unwrap();

        let second = svc.ensure(&source, MediaType::Image).await.unwrap();
        assert_eq!(first, second);
        let modified_again = std::fs::metadata(svc.generator().path_for(&second))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(modified, modified_again);
        assert_eq!(svc.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_ensure_skips_non_visual_types() {
        let thumbs = tempfile::tempdir().unwrap();
        let svc = service(thumbs.path(), PathBuf::from("nonexistent_ffmpeg_12345"));
        assert_eq!(svc.ensure(Path::new("/x/a.pdf"), MediaType::Document).await, None);
    }

    #[tokio::test]
    async fn test_regenerate_replaces_existing() {
        let media = tempfile::tempdir().unwrap();
        let thumbs = tempfile::tempdir().unwrap();
        let source = media.path().join("photo.png");
        RgbImage::from_pixel(50, 50, Rgb([9, 9, 9])).save(&source).unwrap();

        let svc = service(thumbs.path(), PathBuf::from("nonexistent_ffmpeg_12345"));
        let id = thumbnail_id(&source);
        std::fs::write(svc.generator().path_for(&id), b"stale").unwrap();

        assert_eq!(svc.ensure(&source, MediaType::Image).await, Some(id.clone()));
        assert_eq!(std::fs::read(svc.generator().path_for(&id)).unwrap(), b"stale");

        assert_eq!(svc.regenerate(&source, MediaType::Image).await, Some(id.clone()));
        assert!(image::open(svc.generator().path_for(&id)).is_ok());
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_generate_once() {
        use std::os::unix::fs::PermissionsExt;

        let tools = tempfile::tempdir().unwrap();
        let media = tempfile::tempdir().unwrap();
        let thumbs = tempfile::tempdir().unwrap();

        // Stand-in ffmpeg: records each run, then writes the last argument.
        let count_file = tools.path().join("runs");
        let script = tools.path().join("ffmpeg");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho run >> '{}'\nsleep 0.3\nfor last; do :; done\nprintf frame > \"$last\"\n",
                count_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let source = media.path().join("episode.mp4");
        std::fs::write(&source, b"video").unwrap();

        let svc = service(thumbs.path(), script);
        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let svc = svc.clone();
                let source = source.clone();
                tokio::spawn(async move { svc.ensure(&source, MediaType::Video).await })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }

        let expected = Some(thumbnail_id(&source));
        assert!(ids.iter().all(|id| *id == expected));
        let runs = std::fs::read_to_string(&count_file).unwrap();
        assert_eq!(runs.lines().count(), 1);
        assert_eq!(svc.in_flight(), 0);
    }
}
