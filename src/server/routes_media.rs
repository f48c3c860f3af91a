//! Library browsing, playback info and episode navigation.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::stream::{self, StreamExt};
use mediacast_av::{CompatibilityVerdict, VideoProbe};
use mediacast_common::{MediaRecord, MediaType};
use mediacast_parser::{parse_episode, EpisodeInfo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::library::{
    auto_thumbnail_candidate, normalize_relative_path, thumbnail_url, ScannedFile, SeriesEntry,
    SeriesIndex,
};
use crate::server::error::{ApiResult, AppError};
use crate::server::AppContext;
use crate::streaming::stream_url;
use crate::thumbnails::is_valid_thumbnail_id;

/// Thumbnails ensured concurrently while building a listing.
const THUMBNAIL_CONCURRENCY: usize = 4;

/// Types listed by `/api/files` when no type is requested.
const DEFAULT_LISTING_TYPES: [MediaType; 3] = [MediaType::Image, MediaType::Video, MediaType::Audio];

pub fn media_routes() -> Router<AppContext> {
    Router::new()
        .route("/files", get(list_files))
        .route("/video/info/*path", get(video_info))
        .route("/episode/next/*path", get(next_episode))
        .route("/episode/previous/*path", get(previous_episode))
        .route("/series/*path", get(series_episodes))
        .route("/folder-thumbnail/:media_type/*folder", get(folder_thumbnail))
}

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub folder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    #[serde(flatten)]
    pub record: MediaRecord,
    pub folder_label: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeInfo>,
}

async fn list_files(
    State(ctx): State<AppContext>,
    Query(query): Query<FilesQuery>,
) -> ApiResult<Json<Vec<FileResponse>>> {
    let types = match query.media_type.as_deref().filter(|t| !t.is_empty()) {
        Some(raw) => vec![raw.parse::<MediaType>().map_err(AppError::invalid_input)?],
        None => DEFAULT_LISTING_TYPES.to_vec(),
    };
    let folder = match query.folder.as_deref().filter(|f| !f.is_empty()) {
        Some(folder) => Some(normalize_relative_path(folder)?),
        None => None,
    };

    let mut files: Vec<ScannedFile> = Vec::new();
    for media_type in types {
        files.extend(ctx.library.scan(media_type, folder.as_deref()).await?);
    }

    let thumbnails = &ctx.thumbnails;
    let listing = stream::iter(files)
        .map(|file| async move {
            let thumbnail = if file.media_type.has_thumbnail() {
                thumbnails.ensure(&file.path, file.media_type).await
            } else {
                None
            };
            let episode = (file.media_type == MediaType::Video).then(|| parse_episode(&file.filename));
            let record = file.into_record(thumbnail);

            FileResponse {
                folder_label: record.folder_label().to_string(),
                url: stream_url(&record.relative_path, None),
                thumbnail_url: record.thumbnail_ref.as_deref().map(thumbnail_url),
                episode,
                record,
            }
        })
        .buffered(THUMBNAIL_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

    Ok(Json(listing))
}

#[derive(Debug, Serialize)]
pub struct VideoInfoResponse {
    pub filename: String,
    pub duration: f64,
    pub size: u64,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub format: Option<String>,
    pub resolution: Option<String>,
    pub bitrate: Option<u64>,
    pub probe_available: bool,
    pub web_compatible: bool,
    pub compatibility: CompatibilityVerdict,
    pub stream_url: String,
}

impl VideoInfoResponse {
    fn new(relative: String, probe: Option<VideoProbe>, verdict: CompatibilityVerdict) -> Self {
        let stream_url = stream_url(&relative, None);
        let Some(probe) = probe else {
            return Self {
                filename: relative,
                duration: 0.0,
                size: 0,
                video_codec: None,
                audio_codec: None,
                format: None,
                resolution: None,
                bitrate: None,
                probe_available: false,
                web_compatible: false,
                compatibility: verdict,
                stream_url,
            };
        };

        Self {
            filename: relative,
            duration: probe.duration_seconds,
            size: probe.size_bytes,
            resolution: match (probe.width, probe.height) {
                (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
                _ => None,
            },
            video_codec: probe.video_codec,
            audio_codec: probe.audio_codec,
            format: Some(probe.container_format),
            bitrate: probe.bit_rate,
            probe_available: true,
            web_compatible: verdict.is_compatible(),
            compatibility: verdict,
            stream_url,
        }
    }
}

async fn video_info(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> ApiResult<Json<VideoInfoResponse>> {
    let (file, _, relative) = ctx.library.locate(&path, &[MediaType::Video])?;

    let probe = ctx.prober.probe_opt(&file).await;
    let verdict = ctx.config.playback.classify(probe.as_ref());
    if probe.is_some() && !verdict.is_compatible() {
        tracing::debug!(path = %relative, ?verdict, "Video needs an external player");
    }

    Ok(Json(VideoInfoResponse::new(relative, probe, verdict)))
}

#[derive(Debug, Serialize)]
pub struct EpisodeSummary {
    pub filename: String,
    pub relative_path: String,
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub series_name: Option<String>,
    pub stream_url: String,
}

impl From<&SeriesEntry> for EpisodeSummary {
    fn from(entry: &SeriesEntry) -> Self {
        Self {
            filename: entry.record.filename.clone(),
            relative_path: entry.record.relative_path.clone(),
            title: entry.episode.clean_title.clone(),
            season: entry.episode.season,
            episode: entry.episode.episode,
            series_name: entry.episode.series_name.clone(),
            stream_url: stream_url(&entry.record.relative_path, None),
        }
    }
}

/// Scan the video root and find `path` in it.
async fn video_index(ctx: &AppContext, path: &str) -> ApiResult<(SeriesIndex, MediaRecord)> {
    let relative = normalize_relative_path(path)?;
    let records: Vec<MediaRecord> = ctx
        .library
        .scan(MediaType::Video, None)
        .await?
        .into_iter()
        .map(|file| file.into_record(None))
        .collect();

    let current = records
        .iter()
        .find(|record| record.relative_path == relative)
        .cloned()
        .ok_or_else(|| AppError::not_found(relative))?;

    Ok((SeriesIndex::build(records), current))
}

async fn next_episode(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> ApiResult<Json<Value>> {
    let (index, current) = video_index(&ctx, &path).await?;

    Ok(Json(match index.find_next(&current) {
        Some(next) => json!({
            "success": true,
            "next_episode": EpisodeSummary::from(next),
        }),
        None => json!({
            "success": false,
            "message": "No next episode found",
        }),
    }))
}

async fn previous_episode(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> ApiResult<Json<Value>> {
    let (index, current) = video_index(&ctx, &path).await?;

    Ok(Json(match index.find_previous(&current) {
        Some(previous) => json!({
            "success": true,
            "previous_episode": EpisodeSummary::from(previous),
        }),
        None => json!({
            "success": false,
            "message": "No previous episode found",
        }),
    }))
}

#[derive(Debug, Serialize)]
pub struct SeriesEpisode {
    #[serde(flatten)]
    pub summary: EpisodeSummary,
    pub is_current: bool,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub success: bool,
    pub series_name: String,
    pub episodes: Vec<SeriesEpisode>,
}

async fn series_episodes(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
) -> ApiResult<Json<SeriesResponse>> {
    let (index, current) = video_index(&ctx, &path).await?;
    let (key, entries) = index
        .group_for(&current)
        .ok_or_else(|| AppError::not_found(current.relative_path.clone()))?;

    Ok(Json(SeriesResponse {
        success: true,
        series_name: key.to_string(),
        episodes: entries
            .iter()
            .map(|entry| SeriesEpisode {
                summary: entry.into(),
                is_current: entry.record.relative_path == current.relative_path,
            })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct FolderThumbnailResponse {
    pub thumbnail_url: Option<String>,
}

async fn folder_thumbnail(
    State(ctx): State<AppContext>,
    Path((media_type, folder)): Path<(String, String)>,
) -> ApiResult<Json<FolderThumbnailResponse>> {
    let media_type: MediaType = media_type.parse().map_err(AppError::invalid_input)?;
    let folder = match folder.trim_matches('/') {
        "" | mediacast_common::ROOT_FOLDER_LABEL => String::new(),
        folder => normalize_relative_path(folder)?,
    };

    if let Some(reference) = ctx.folder_thumbnails.lookup(media_type, &folder) {
        return Ok(Json(FolderThumbnailResponse {
            thumbnail_url: Some(thumbnail_url(&reference)),
        }));
    }

    let dir = ctx.library.media_dir(media_type).join(&folder);
    let candidate = tokio::task::spawn_blocking(move || auto_thumbnail_candidate(&dir))
        .await
        .map_err(|e| AppError(mediacast_common::Error::internal(e.to_string())))?;

    let reference = match candidate {
        Some((source, source_type)) => ctx.thumbnails.ensure(&source, source_type).await,
        None => None,
    };

    Ok(Json(FolderThumbnailResponse {
        thumbnail_url: reference.as_deref().map(thumbnail_url),
    }))
}

/// `GET /thumbnail/:id`, public and read-only.
pub async fn serve_thumbnail(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !is_valid_thumbnail_id(&id) {
        return Err(AppError::not_found(id));
    }

    let path = ctx.thumbnails.generator().path_for(&id);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::not_found(id)),
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    ))
}
