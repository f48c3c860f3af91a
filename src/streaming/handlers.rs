//! HTTP handlers for file delivery and streaming tokens.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::Response,
    Extension, Json,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use chrono::{DateTime, Utc};
use mediacast_common::MediaType;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::content_type::{content_type_for, is_video_content_type};
use super::range::serve_file;
use crate::library::normalize_relative_path;
use crate::server::auth::{identify, AuthUser};
use crate::server::error::{ApiResult, AppError};
use crate::server::AppContext;

/// Characters escaped in the path part of a stream URL.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Players that cannot carry a session and rely on streaming tokens.
const EXTERNAL_PLAYERS: &[&str] = &["vlc", "mpv", "mplayer", "kodi", "ffmpeg", "lavf"];

/// URL of the stream endpoint for a relative path.
pub fn stream_url(relative_path: &str, token: Option<&str>) -> String {
    let path = utf8_percent_encode(relative_path, PATH_SET);
    match token {
        Some(token) => format!("/stream/{}?token={}", path, token),
        None => format!("/stream/{}", path),
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub token: Option<String>,
}

/// `GET /stream/*path`: range-aware delivery from any media root.
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Path(path): Path<String>,
    Query(query): Query<StreamQuery>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let relative = normalize_relative_path(&path)?;

    let authorized = identify(&ctx, bearer.as_ref(), &jar).is_some()
        || query
            .token
            .as_deref()
            .is_some_and(|token| ctx.tokens.validate(token, &relative));
    if !authorized {
        return Err(AppError::unauthorized());
    }

    let (file, _, relative) = ctx.library.locate(&relative, &MediaType::ALL)?;
    let content_type = content_type_for(&file);

    let duration = if is_video_content_type(content_type) {
        log_player(&headers, &relative);
        ctx.prober
            .probe_opt(&file)
            .await
            .map(|probe| probe.duration_seconds)
    } else {
        None
    };

    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());

    Ok(serve_file(&file, range, ctx.config.streaming.chunk_size, duration).await?)
}

fn log_player(headers: &HeaderMap, relative: &str) {
    let Some(agent) = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
    else {
        return;
    };

    let lower = agent.to_lowercase();
    if let Some(player) = EXTERNAL_PLAYERS.iter().find(|p| lower.contains(*p)) {
        tracing::debug!(player, path = relative, "External player streaming");
    }
}

#[derive(Debug, Serialize)]
pub struct StreamTokenResponse {
    pub success: bool,
    pub token: String,
    pub filename: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
    pub stream_url: String,
}

/// `POST /api/stream-token/*path`: issue a token for an existing file.
pub async fn issue_stream_token(
    State(ctx): State<AppContext>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<String>,
) -> ApiResult<Json<StreamTokenResponse>> {
    let (_, _, relative) = ctx.library.locate(&path, &MediaType::ALL)?;
    let token = ctx.tokens.issue(&relative, &user.0);

    Ok(Json(StreamTokenResponse {
        success: true,
        stream_url: stream_url(&relative, Some(&token.token)),
        expires_in: (token.expires_at - token.issued_at).num_seconds(),
        expires_at: token.expires_at,
        filename: token.filename,
        token: token.token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_url_escapes_path() {
        assert_eq!(stream_url("Show/e1.mp4", None), "/stream/Show/e1.mp4");
        assert_eq!(
            stream_url("My Show/Ep #1 & 2.mkv", Some("abc_-")),
            "/stream/My%20Show/Ep%20%231%20%26%202.mkv?token=abc_-"
        );
    }
}
