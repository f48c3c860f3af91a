//! Grouping of video files into ordered series.
//!
//! Videos are grouped by folder, or by the series name parsed from the
//! filename when they sit at a media root. Each group is ordered by season,
//! episode and then natural filename order.

use std::collections::HashMap;

use mediacast_common::MediaRecord;
use mediacast_parser::{parse_episode, EpisodeInfo, NaturalKey};

/// Group name for videos with neither a folder nor a parsable series.
pub const UNKNOWN_SERIES: &str = "Unknown Series";

/// A video together with what its filename says about it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub record: MediaRecord,
    pub episode: EpisodeInfo,
}

impl SeriesEntry {
    pub fn new(record: MediaRecord) -> Self {
        let episode = parse_episode(&record.filename);
        Self { record, episode }
    }

    fn sort_key(&self) -> (u32, u32, NaturalKey) {
        (
            self.episode.season.unwrap_or(0),
            self.episode.episode.unwrap_or(0),
            NaturalKey::new(&self.record.filename),
        )
    }
}

/// Grouping key for a video.
pub fn series_key(record: &MediaRecord, episode: &EpisodeInfo) -> String {
    let raw = if record.folder.is_empty() {
        episode.series_name.as_deref().unwrap_or(UNKNOWN_SERIES)
    } else {
        record.folder.as_str()
    };

    let key = raw.replace('/', " ");
    let key = key.trim();
    if key.is_empty() {
        UNKNOWN_SERIES.to_string()
    } else {
        key.to_string()
    }
}

/// Ordered series groups built from one scan.
#[derive(Debug, Default)]
pub struct SeriesIndex {
    groups: HashMap<String, Vec<SeriesEntry>>,
}

impl SeriesIndex {
    /// Group the video records among `records`; other types are ignored.
    pub fn build(records: impl IntoIterator<Item = MediaRecord>) -> Self {
        let mut groups: HashMap<String, Vec<SeriesEntry>> = HashMap::new();

        for record in records.into_iter().filter(MediaRecord::is_video) {
            let entry = SeriesEntry::new(record);
            let key = series_key(&entry.record, &entry.episode);
            groups.entry(key).or_default().push(entry);
        }

        for entries in groups.values_mut() {
            entries.sort_by_cached_key(SeriesEntry::sort_key);
        }

        Self { groups }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, key: &str) -> Option<&[SeriesEntry]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// The key and ordered members of the group `record` belongs to.
    pub fn group_for(&self, record: &MediaRecord) -> Option<(&str, &[SeriesEntry])> {
        if !record.is_video() {
            return None;
        }
        let key = series_key(record, &parse_episode(&record.filename));
        self.groups
            .get_key_value(&key)
            .map(|(key, entries)| (key.as_str(), entries.as_slice()))
    }

    fn position(&self, record: &MediaRecord) -> Option<(&[SeriesEntry], usize)> {
        let (_, entries) = self.group_for(record)?;
        let index = entries
            .iter()
            .position(|entry| entry.record.filename == record.filename)?;
        Some((entries, index))
    }

    /// The episode after `record` in its group.
    pub fn find_next(&self, record: &MediaRecord) -> Option<&SeriesEntry> {
        let (entries, index) = self.position(record)?;
        entries.get(index + 1)
    }

    /// The episode before `record` in its group.
    pub fn find_previous(&self, record: &MediaRecord) -> Option<&SeriesEntry> {
        let (entries, index) = self.position(record)?;
        index.checked_sub(1).and_then(|i| entries.get(i))
    }
}
