//! Error responses for API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Handler error rendered as `{"error": ..., "code": ...}`.
#[derive(Debug)]
pub struct AppError(pub mediacast_common::Error);

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(mediacast_common::Error::not_found(msg))
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self(mediacast_common::Error::invalid_input(msg))
    }

    pub fn unauthorized() -> Self {
        Self(mediacast_common::Error::Unauthorized)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<mediacast_common::Error> for AppError {
    fn from(err: mediacast_common::Error) -> Self {
        Self(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, AppError>;
