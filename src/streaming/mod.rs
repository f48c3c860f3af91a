//! File delivery.
//!
//! Any library file is served from `GET /stream/{relative_path}` with HTTP
//! range support. External players that cannot hold a session use a
//! short-lived token issued by `POST /api/stream-token/{relative_path}`.

pub mod content_type;
mod handlers;
pub mod range;
pub mod tokens;

pub use content_type::{content_type_for, is_video_content_type, OCTET_STREAM};
pub use handlers::{issue_stream_token, stream_media, stream_url, StreamTokenResponse};
pub use range::{parse_range_header, plan, serve_file, ByteRange, RangePlan, X_CONTENT_DURATION};
pub use tokens::{start_sweep_task, StreamingToken, StreamingTokenStore};

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppContext;

/// Public streaming routes, nested under `/stream`.
///
/// Authentication is checked by the handler itself so that a streaming
/// token can stand in for a session.
pub fn stream_router() -> Router<AppContext> {
    Router::new().route("/*path", get(stream_media))
}

/// Token issuing routes, merged into the protected API.
pub fn token_routes() -> Router<AppContext> {
    Router::new().route("/stream-token/*path", post(issue_stream_token))
}
