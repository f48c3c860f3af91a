//! Mediacast-Common: Shared types, extension tables, and errors.
//!
//! This crate provides common functionality used across mediacast:
//!
//! - **Core Types**: [`MediaType`] and the per-scan [`MediaRecord`]
//! - **Path Utilities**: Extension tables and media type detection
//! - **Error Handling**: A common error type with HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use mediacast_common::{Error, MediaType, Result};
//! use mediacast_common::paths::media_type_of;
//! use std::path::Path;
//!
//! assert_eq!(media_type_of(Path::new("Show S01E01.mkv")), Some(MediaType::Video));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("Show S01E01.mkv"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
