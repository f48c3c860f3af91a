//! Episode pattern matchers.
//!
//! Each matcher is an independent pure function over a filename with its
//! extension already stripped. [`MATCHERS`] lists them in priority order;
//! the parser stops at the first one that returns a match.
//!
//! All patterns are unanchored and case-insensitive. The series name is the
//! shortest leading text that is followed by whitespace and the marker.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Structured result of a successful matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    /// Series name, trimmed and never empty.
    pub series_name: String,
    /// Season number, only for patterns that carry one.
    pub season: Option<u32>,
    /// Episode number.
    pub episode: u32,
}

/// A single matcher strategy.
pub type Matcher = fn(&str) -> Option<EpisodeMatch>;

/// Matchers in priority order.
pub const MATCHERS: &[(&str, Matcher)] = &[
    ("season_episode", match_season_episode),
    ("season_word_episode_word", match_season_word_episode_word),
    ("season_x_episode", match_season_x_episode),
    ("episode_marker", match_episode_marker),
    ("trailing_number", match_trailing_number),
];

static SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(.+?)\s+s(\d+)e(\d+)").expect("valid regex"));

static SEASON_WORD_EPISODE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(.+?)\s+season\s*(\d+).*?episode\s*(\d+)").expect("valid regex")
});

static SEASON_X_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(.+?)\s+(\d+)x(\d+)").expect("valid regex"));

// Tried in order: "Ep01" / "Ep. 01", "Episode 01", "E01".
static EPISODE_MARKERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(.+?)\s+ep\.?\s*(\d+)").expect("valid regex"),
        Regex::new(r"(?i)(.+?)\s+episode\s*(\d+)").expect("valid regex"),
        Regex::new(r"(?i)(.+?)\s+e(\d+)").expect("valid regex"),
    ]
});

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+?)\s+(\d+)").expect("valid regex"));

/// `<series> S<season>E<episode>`
pub fn match_season_episode(name: &str) -> Option<EpisodeMatch> {
    with_season(SEASON_EPISODE.captures(name)?)
}

/// `<series> Season <season> ... Episode <episode>`
pub fn match_season_word_episode_word(name: &str) -> Option<EpisodeMatch> {
    with_season(SEASON_WORD_EPISODE_WORD.captures(name)?)
}

/// `<series> <season>x<episode>`
pub fn match_season_x_episode(name: &str) -> Option<EpisodeMatch> {
    with_season(SEASON_X_EPISODE.captures(name)?)
}

/// `<series> Ep<episode>`, `<series> Episode <episode>` or `<series> E<episode>`
pub fn match_episode_marker(name: &str) -> Option<EpisodeMatch> {
    EPISODE_MARKERS
        .iter()
        .find_map(|re| re.captures(name))
        .and_then(episode_only)
}

/// `<series> <episode>`
pub fn match_trailing_number(name: &str) -> Option<EpisodeMatch> {
    episode_only(TRAILING_NUMBER.captures(name)?)
}

fn with_season(caps: Captures<'_>) -> Option<EpisodeMatch> {
    Some(EpisodeMatch {
        series_name: series_from(&caps)?,
        season: Some(number_at(&caps, 2)?),
        episode: number_at(&caps, 3)?,
    })
}

fn episode_only(caps: Captures<'_>) -> Option<EpisodeMatch> {
    Some(EpisodeMatch {
        series_name: series_from(&caps)?,
        season: None,
        episode: number_at(&caps, 2)?,
    })
}

fn series_from(caps: &Captures<'_>) -> Option<String> {
    let series = caps.get(1)?.as_str().trim();
    (!series.is_empty()).then(|| series.to_string())
}

fn number_at(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}
