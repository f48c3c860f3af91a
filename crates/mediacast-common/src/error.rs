//! Common error types used throughout mediacast.
//!
//! Each variant maps to an HTTP status via [`Error::http_status`] so the
//! server can turn failures into responses without re-classifying them.

/// Common error type for mediacast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested file was not found under any media root.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Unauthorized => 401,
            Self::InvalidInput(_) => 400,
            Self::Io(_) | Self::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
