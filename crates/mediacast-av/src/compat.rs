//! Browser playback compatibility.
//!
//! A video plays directly in a browser when its container is one the browser
//! can demux, its video codec is decodable and its audio codec, if any, is
//! decodable too. Everything else is flagged for an external player.

use crate::probe::VideoProbe;
use serde::{Deserialize, Serialize};

/// Allow-lists used to classify a probe. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRules {
    /// Container tokens; a probe matches when its format name contains one.
    #[serde(default = "default_containers")]
    pub containers: Vec<String>,
    /// Accepted video codec names.
    #[serde(default = "default_video_codecs")]
    pub video_codecs: Vec<String>,
    /// Accepted audio codec names.
    #[serde(default = "default_audio_codecs")]
    pub audio_codecs: Vec<String>,
}

fn default_containers() -> Vec<String> {
    to_strings(&["mp4", "webm", "ogg", "mov"])
}

fn default_video_codecs() -> Vec<String> {
    to_strings(&["h264", "avc1", "vp8", "vp9", "av01"])
}

fn default_audio_codecs() -> Vec<String> {
    to_strings(&["aac", "mp3", "opus", "vorbis", "mp4a"])
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for CompatibilityRules {
    fn default() -> Self {
        Self {
            containers: default_containers(),
            video_codecs: default_video_codecs(),
            audio_codecs: default_audio_codecs(),
        }
    }
}

/// Outcome of a classification, clause by clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompatibilityVerdict {
    pub probe_available: bool,
    pub container_ok: bool,
    pub video_ok: bool,
    pub audio_ok: bool,
}

impl CompatibilityVerdict {
    /// Whether the browser can play the file directly.
    pub fn is_compatible(&self) -> bool {
        self.probe_available && self.container_ok && self.video_ok && self.audio_ok
    }
}

impl CompatibilityRules {
    /// Classify a probe. A missing probe is never compatible.
    pub fn classify(&self, probe: Option<&VideoProbe>) -> CompatibilityVerdict {
        let Some(probe) = probe else {
            return CompatibilityVerdict {
                probe_available: false,
                container_ok: false,
                video_ok: false,
                audio_ok: false,
            };
        };

        let format_name = probe.container_format.to_lowercase();
        let container_ok = self
            .containers
            .iter()
            .any(|token| format_name.contains(&token.to_lowercase()));

        let video_ok = probe
            .video_codec
            .as_deref()
            .is_some_and(|codec| contains_ignore_case(&self.video_codecs, codec));

        let audio_ok = probe
            .audio_codec
            .as_deref()
            .map_or(true, |codec| contains_ignore_case(&self.audio_codecs, codec));

        let verdict = CompatibilityVerdict {
            probe_available: true,
            container_ok,
            video_ok,
            audio_ok,
        };

        tracing::debug!(
            format = %probe.container_format,
            video_codec = probe.video_codec.as_deref().unwrap_or("none"),
            audio_codec = probe.audio_codec.as_deref().unwrap_or("none"),
            container_ok,
            video_ok,
            audio_ok,
            compatible = verdict.is_compatible(),
            "playback compatibility"
        );

        verdict
    }

    /// Shorthand for `classify(probe).is_compatible()`.
    pub fn is_web_compatible(&self, probe: Option<&VideoProbe>) -> bool {
        self.classify(probe).is_compatible()
    }
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(container: &str, video: Option<&str>, audio: Option<&str>) -> VideoProbe {
        VideoProbe {
            container_format: container.to_string(),
            video_codec: video.map(String::from),
            audio_codec: audio.map(String::from),
            duration_seconds: 60.0,
            size_bytes: 1024,
            width: Some(1280),
            height: Some(720),
            bit_rate: None,
        }
    }

    #[test]
    fn test_mp4_h264_aac_is_compatible() {
        let rules = CompatibilityRules::default();
        let p = probe("mov,mp4,m4a,3gp,3g2,mj2", Some("h264"), Some("aac"));
        assert!(rules.is_web_compatible(Some(&p)));
    }

    #[test]
    fn test_mkv_hevc_is_not_compatible() {
        let rules = CompatibilityRules::default();
        let p = probe("matroska,webm", Some("hevc"), Some("aac"));
        let verdict = rules.classify(Some(&p));
        assert!(verdict.container_ok);
        assert!(!verdict.video_ok);
        assert!(verdict.audio_ok);
        assert!(!verdict.is_compatible());
    }

    #[test]
    fn test_no_audio_counts_as_compatible() {
        let rules = CompatibilityRules::default();
        let p = probe("mov,mp4,m4a,3gp,3g2,mj2", Some("h264"), None);
        assert!(rules.is_web_compatible(Some(&p)));
    }

    #[test]
    fn test_incompatible_audio() {
        let rules = CompatibilityRules::default();
        let p = probe("mov,mp4,m4a,3gp,3g2,mj2", Some("h264"), Some("ac3"));
        let verdict = rules.classify(Some(&p));
        assert!(!verdict.audio_ok);
        assert!(!verdict.is_compatible());
    }

    #[test]
    fn test_missing_video_stream() {
        let rules = CompatibilityRules::default();
        let p = probe("mp4", None, Some("aac"));
        assert!(!rules.is_web_compatible(Some(&p)));
    }

    #[test]
    fn test_unknown_container() {
        let rules = CompatibilityRules::default();
        let p = probe("avi", Some("h264"), Some("mp3"));
        assert!(!rules.classify(Some(&p)).container_ok);
    }

    #[test]
    fn test_case_insensitive() {
        let rules = CompatibilityRules::default();
        let p = probe("MOV,MP4", Some("H264"), Some("AAC"));
        assert!(rules.is_web_compatible(Some(&p)));
    }

    #[test]
    fn test_no_probe() {
        let rules = CompatibilityRules::default();
        let verdict = rules.classify(None);
        assert!(!verdict.probe_available);
        assert!(!verdict.is_compatible());
    }

    #[test]
    fn test_custom_rules_from_partial_toml_like_json() {
        let rules: CompatibilityRules =
            serde_json::from_str(r#"{"video_codecs": ["hevc"]}"#).unwrap();
        assert_eq!(rules.containers, default_containers());
        let p = probe("mp4", Some("hevc"), None);
        assert!(rules.is_web_compatible(Some(&p)));
    }
}
