//! Mediacast - personal media server.
//!
//! Serves a directory tree of images, videos, music, documents, code and
//! archives over HTTP with byte-range streaming, lazily generated
//! thumbnails, browser playability checks and filename-based episode
//! navigation.
//!
//! This library crate exposes the server pieces for integration testing.

pub mod config;
pub mod library;
pub mod notifications;
pub mod server;
pub mod streaming;
pub mod thumbnails;
