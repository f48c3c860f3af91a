//! # mediacast-parser
//!
//! Infers series, season and episode numbers from media filenames and
//! provides the natural ordering used to sequence episodes.
//!
//! ## Quick Start
//!
//! ```
//! use mediacast_parser::parse_episode;
//!
//! let info = parse_episode("Breaking Bad S01E05.mp4");
//! assert_eq!(info.series_name.as_deref(), Some("Breaking Bad"));
//! assert_eq!(info.season, Some(1));
//! assert_eq!(info.episode, Some(5));
//! ```
//!
//! ## Natural ordering
//!
//! ```
//! use mediacast_parser::natural_cmp;
//! use std::cmp::Ordering;
//!
//! assert_eq!(natural_cmp("Ep2", "Ep10"), Ordering::Less);
//! ```

mod episode;
pub mod matchers;
mod natural;

pub use episode::{parse_episode, strip_video_extension, EpisodeInfo};
pub use matchers::{EpisodeMatch, Matcher, MATCHERS};
pub use natural::{natural_cmp, NaturalKey};
