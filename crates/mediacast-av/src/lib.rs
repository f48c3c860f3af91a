//! # mediacast-av
//!
//! Thin async wrappers around the ffprobe and ffmpeg command-line tools,
//! plus the rules deciding whether a browser can play a video directly.
//!
//! This crate provides:
//! - [`Prober`]: probe a file into a [`VideoProbe`]
//! - [`CompatibilityRules`]: classify a probe for direct browser playback
//! - [`FrameExtractor`]: grab a single letterboxed frame for thumbnails
//! - [`check_tools`]: report which external tools are installed
//!
//! Every external process runs under a timeout and is killed if the caller
//! stops waiting.
//!
//! ## Example
//!
//! ```no_run
//! use mediacast_av::{CompatibilityRules, Prober};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn run() {
//! let prober = Prober::new("ffprobe", Duration::from_secs(30));
//! let probe = prober.probe_opt(Path::new("/media/Movies/film.mp4")).await;
//! let playable = CompatibilityRules::default().is_web_compatible(probe.as_ref());
//! println!("direct play: {}", playable);
//! # }
//! ```

pub mod compat;
mod error;
pub mod extract;
pub mod probe;
mod runner;
pub mod tools;

// Re-exports
pub use compat::{CompatibilityRules, CompatibilityVerdict};
pub use error::{Error, Result};
pub use extract::FrameExtractor;
pub use probe::{parse_ffprobe_json, Prober, VideoProbe};
pub use tools::{check_tool, check_tools, resolve_tool, ToolInfo};
