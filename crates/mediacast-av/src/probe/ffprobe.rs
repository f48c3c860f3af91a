//! Parsing of `ffprobe -print_format json` output.

use super::VideoProbe;
use crate::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    format_name: String,
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse ffprobe JSON into a [`VideoProbe`].
///
/// The first video stream and the first audio stream, in file order, supply
/// the codecs. Numeric fields arrive as strings; anything unparseable is
/// treated as absent.
pub fn parse_ffprobe_json(json: &str) -> Result<VideoProbe> {
    let output: FfprobeOutput = serde_json::from_str(json)?;

    let video = output.streams.iter().find(|s| s.codec_type == "video");
    let audio = output.streams.iter().find(|s| s.codec_type == "audio");

    let duration_seconds = output
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(0.0);

    Ok(VideoProbe {
        container_format: output.format.format_name,
        video_codec: video.and_then(|s| s.codec_name.clone()),
        audio_codec: audio.and_then(|s| s.codec_name.clone()),
        duration_seconds,
        size_bytes: output
            .format
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        bit_rate: output
            .format
            .bit_rate
            .as_deref()
            .and_then(|s| s.parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const H264_AAC: &str = include_str!("../../tests/fixtures/ffprobe_h264_aac.json");
    const HEVC_MKV: &str = include_str!("../../tests/fixtures/ffprobe_hevc_ac3_mkv.json");

    #[test]
    fn test_parse_mp4() {
        let probe = parse_ffprobe_json(H264_AAC).unwrap();
        assert_eq!(probe.container_format, "mov,mp4,m4a,3gp,3g2,mj2");
        assert_eq!(probe.video_codec.as_deref(), Some("h264"));
        assert_eq!(probe.audio_codec.as_deref(), Some("aac"));
        assert!((probe.duration_seconds - 1421.568).abs() < 1e-9);
        assert_eq!(probe.size_bytes, 821_394_133);
        assert_eq!(probe.width, Some(1920));
        assert_eq!(probe.height, Some(1080));
        assert_eq!(probe.bit_rate, Some(4_622_574));
    }

    #[test]
    fn test_first_streams_in_file_order() {
        let probe = parse_ffprobe_json(HEVC_MKV).unwrap();
        assert_eq!(probe.video_codec.as_deref(), Some("hevc"));
        assert_eq!(probe.audio_codec.as_deref(), Some("ac3"));
        assert_eq!(probe.width, Some(3840));
        assert_eq!(probe.bit_rate, None);
    }

    #[test]
    fn test_missing_audio_and_duration() {
        let json = r#"{
            "streams": [{"codec_type": "video", "codec_name": "vp9"}],
            "format": {"format_name": "matroska,webm"}
        }"#;
        let probe = parse_ffprobe_json(json).unwrap();
        assert_eq!(probe.audio_codec, None);
        assert_eq!(probe.duration_seconds, 0.0);
        assert_eq!(probe.size_bytes, 0);
    }

    #[test]
    fn test_bad_numbers_are_absent() {
        let json = r#"{
            "streams": [],
            "format": {"format_name": "mp4", "duration": "N/A", "size": "-1"}
        }"#;
        let probe = parse_ffprobe_json(json).unwrap();
        assert_eq!(probe.duration_seconds, 0.0);
        assert_eq!(probe.size_bytes, 0);
        assert_eq!(probe.video_codec, None);
    }

    #[test]
    fn test_malformed_json() {
        assert!(parse_ffprobe_json("not json").is_err());
        assert!(parse_ffprobe_json("").is_err());
    }
}
