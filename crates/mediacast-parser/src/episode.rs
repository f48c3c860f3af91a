use regex::Regex;
use std::sync::LazyLock;

use crate::matchers::MATCHERS;

/// Extensions stripped from a filename before matching.
const TITLE_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v"];

static LAST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

static TRAILING_NUMBER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\d+\s*$").expect("valid regex"));

/// Episode metadata inferred from a filename.
///
/// Derived data only; it is recomputed whenever it is needed and never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeInfo {
    /// Filename with a recognised video extension removed.
    pub clean_title: String,
    /// Inferred series name.
    pub series_name: Option<String>,
    /// Season number, when the filename carries one.
    pub season: Option<u32>,
    /// Episode number.
    pub episode: Option<u32>,
}

/// Remove a trailing video extension, case-insensitively.
///
/// ```
/// use mediacast_parser::strip_video_extension;
///
/// assert_eq!(strip_video_extension("Show 01.MKV"), "Show 01");
/// assert_eq!(strip_video_extension("notes.txt"), "notes.txt");
/// ```
pub fn strip_video_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if TITLE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => filename,
    }
}

/// Infer series, season and episode from a filename.
///
/// The matchers in [`MATCHERS`] are tried in order and the first hit wins.
/// When none matches, the last run of digits becomes the episode number and
/// whatever precedes a trailing number becomes the series name.
pub fn parse_episode(filename: &str) -> EpisodeInfo {
    let clean_title = strip_video_extension(filename);

    if let Some(found) = MATCHERS
        .iter()
        .find_map(|(_, matcher)| matcher(clean_title))
    {
        return EpisodeInfo {
            clean_title: clean_title.to_string(),
            series_name: Some(found.series_name),
            season: found.season,
            episode: Some(found.episode),
        };
    }

    fallback(clean_title)
}

fn fallback(clean_title: &str) -> EpisodeInfo {
    let mut info = EpisodeInfo {
        clean_title: clean_title.to_string(),
        ..Default::default()
    };

    if let Some(last) = LAST_NUMBER.find_iter(clean_title).last() {
        info.episode = last.as_str().parse().ok();
        let series = TRAILING_NUMBER_SUFFIX.replace(clean_title, "");
        let series = series.trim();
        if !series.is_empty() {
            info.series_name = Some(series.to_string());
        }
    }

    info
}
