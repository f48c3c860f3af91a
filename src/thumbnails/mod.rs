//! Lazily generated preview images.
//!
//! [`ThumbnailGenerator`] renders one thumbnail; [`ThumbnailService`] is the
//! shared, coalescing front-end used by request handlers.

mod generator;
mod service;

pub use generator::{is_valid_thumbnail_id, thumbnail_id, ThumbnailGenerator};
pub use service::ThumbnailService;
