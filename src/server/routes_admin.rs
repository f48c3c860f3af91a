//! Maintenance endpoints.

use std::collections::{BTreeMap, HashSet};

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, StreamExt};
use mediacast_common::MediaType;
use serde::Serialize;

use crate::library::ScannedFile;
use crate::notifications::notify_refresh;
use crate::server::error::{ApiResult, AppError};
use crate::server::AppContext;
use crate::thumbnails::thumbnail_id;

/// Concurrent renders during a bulk regeneration.
const REGENERATE_CONCURRENCY: usize = 4;

pub fn admin_routes() -> Router<AppContext> {
    Router::new()
        .route("/admin/generate-thumbnails", post(generate_thumbnails))
        .route("/admin/cleanup-thumbnails", post(cleanup_thumbnails))
        .route("/admin/stats", get(stats))
        .route("/admin/refresh-library", post(refresh_library))
}

async fn scan_all(ctx: &AppContext, types: &[MediaType]) -> ApiResult<Vec<ScannedFile>> {
    let mut files = Vec::new();
    for &media_type in types {
        files.extend(ctx.library.scan(media_type, None).await?);
    }
    Ok(files)
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generated: usize,
    pub failed: usize,
    pub message: String,
}

async fn generate_thumbnails(State(ctx): State<AppContext>) -> ApiResult<Json<GenerateResponse>> {
    let files: Vec<ScannedFile> = scan_all(&ctx, &[MediaType::Image, MediaType::Video])
        .await?
        .into_iter()
        .filter(|f| f.media_type.has_thumbnail())
        .collect();
    let thumbnails = &ctx.thumbnails;

    let results: Vec<bool> = stream::iter(files)
        .map(|file| async move {
            thumbnails
                .regenerate(&file.path, file.media_type)
                .await
                .is_some()
        })
        .buffer_unordered(REGENERATE_CONCURRENCY)
        .collect()
        .await;

    let generated = results.iter().filter(|ok| **ok).count();
    let failed = results.len() - generated;
    tracing::info!(generated, failed, "Thumbnail regeneration finished");

    Ok(Json(GenerateResponse {
        generated,
        failed,
        message: format!("Generated {} thumbnails", generated),
    }))
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: usize,
    pub message: String,
}

async fn cleanup_thumbnails(State(ctx): State<AppContext>) -> ApiResult<Json<CleanupResponse>> {
    let files = scan_all(&ctx, &MediaType::ALL).await?;
    let mut keep: HashSet<String> = files.iter().map(|f| thumbnail_id(&f.path)).collect();
    keep.extend(ctx.folder_thumbnails.stored_files());

    let thumbnails = ctx.thumbnails.clone();
    let removed =
        tokio::task::spawn_blocking(move || thumbnails.generator().remove_orphans(&keep))
            .await
            .map_err(|e| AppError(mediacast_common::Error::internal(e.to_string())))?;

    Ok(Json(CleanupResponse {
        removed,
        message: format!("Removed {} orphaned thumbnails", removed),
    }))
}

#[derive(Debug, Default, Serialize)]
pub struct TypeStats {
    pub files: usize,
    pub bytes: u64,
    pub folders: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_files: usize,
    pub total_bytes: u64,
    pub by_type: BTreeMap<MediaType, TypeStats>,
    pub thumbnails: usize,
    pub active_stream_tokens: usize,
}

async fn stats(State(ctx): State<AppContext>) -> ApiResult<Json<StatsResponse>> {
    let files = scan_all(&ctx, &MediaType::ALL).await?;

    let mut by_type = BTreeMap::new();
    for media_type in MediaType::ALL {
        let folders = ctx.library.count_folders(media_type).await?;
        by_type.insert(
            media_type,
            TypeStats {
                folders,
                ..Default::default()
            },
        );
    }
    for file in &files {
        let entry = by_type.entry(file.media_type).or_default();
        entry.files += 1;
        entry.bytes += file.size_bytes;
    }

    let thumbnails = ctx.thumbnails.clone();
    let thumbnail_count = tokio::task::spawn_blocking(move || thumbnails.generator().stored_ids().len())
        .await
        .map_err(|e| AppError(mediacast_common::Error::internal(e.to_string())))?;

    Ok(Json(StatsResponse {
        total_files: files.len(),
        total_bytes: files.iter().map(|f| f.size_bytes).sum(),
        by_type,
        thumbnails: thumbnail_count,
        active_stream_tokens: ctx.tokens.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
}

async fn refresh_library(State(ctx): State<AppContext>) -> Json<RefreshResponse> {
    let Some(notifier) = ctx.notifier.as_deref() else {
        return Json(RefreshResponse {
            success: false,
            message: "No media server configured".to_string(),
        });
    };

    let success = notify_refresh(notifier).await;
    Json(RefreshResponse {
        success,
        message: if success {
            format!("{} library refresh triggered", notifier.name())
        } else {
            format!("Failed to refresh {} library", notifier.name())
        },
    })
}
