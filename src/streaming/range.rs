//! Byte-range file delivery.
//!
//! Only the first range of a `Range` header is honoured. Anything that does
//! not parse is treated as "no range" and the whole file is served; a range
//! starting at or past the end of the file is answered with 416.

use axum::{
    body::Body,
    http::{header, HeaderName, StatusCode},
    response::Response,
};
use mediacast_common::Error;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::content_type::{content_type_for, is_video_content_type};

/// Duration in seconds, sent with every video response.
pub const X_CONTENT_DURATION: HeaderName = HeaderName::from_static("x-content-duration");

/// An inclusive byte range within a file of `total` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// How a request should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    /// 200 with the whole file.
    Full,
    /// 206 with the given slice.
    Partial(ByteRange),
    /// 416, the range starts beyond the end of the file.
    Unsatisfiable,
}

/// Parse the first range of a `bytes=` header into `(start, end)`.
///
/// Returns `None` when there is no numeric start, which includes suffix
/// ranges such as `bytes=-500`. A non-numeric end reads as an open end.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.trim().strip_prefix("bytes=")?;
    let first = spec.split(',').next()?;
    let (start, end) = first.split_once('-')?;

    let start = start.trim().parse::<u64>().ok()?;
    let end = end.trim().parse::<u64>().ok();

    Some((start, end))
}

/// Decide how to answer a request for a file of `size` bytes.
pub fn plan(range_header: Option<&str>, size: u64) -> RangePlan {
    let Some(value) = range_header else {
        return RangePlan::Full;
    };
    if size == 0 {
        return RangePlan::Full;
    }
    let Some((start, end)) = parse_range_header(value) else {
        return RangePlan::Full;
    };
    if start >= size {
        return RangePlan::Unsatisfiable;
    }

    let end = end.unwrap_or(size - 1).min(size - 1);
    if end < start {
        return RangePlan::Full;
    }

    RangePlan::Partial(ByteRange {
        start,
        end,
        total: size,
    })
}

/// Build a streaming response for `path`.
///
/// `video_duration` feeds `X-Content-Duration` on video responses. Each body
/// chunk is at most `chunk_size` bytes.
pub async fn serve_file(
    path: &Path,
    range_header: Option<&str>,
    chunk_size: usize,
    video_duration: Option<f64>,
) -> Result<Response, Error> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::not_found(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    if !metadata.is_file() {
        return Err(Error::not_found(path.display().to_string()));
    }
    let size = metadata.len();
    let content_type = content_type_for(path);

    let plan = plan(range_header, size);
    tracing::debug!(
        path = %path.display(),
        content_type,
        size,
        ?plan,
        "streaming file"
    );

    let mut builder = Response::builder()
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0");

    let (status, start, length) = match plan {
        RangePlan::Unsatisfiable => {
            return builder
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", size))
                .body(Body::empty())
                .map_err(|e| Error::internal(e.to_string()));
        }
        RangePlan::Full => (StatusCode::OK, 0, size),
        RangePlan::Partial(range) => {
            builder = builder.header(header::CONTENT_RANGE, range.content_range());
            (StatusCode::PARTIAL_CONTENT, range.start, range.len())
        }
    };

    builder = builder
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, length);

    if is_video_content_type(content_type) {
        builder = builder
            .header(X_CONTENT_DURATION, video_duration.unwrap_or(0.0).to_string())
            .header(header::CONTENT_DISPOSITION, "inline");
    }

    let mut file = File::open(path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    let stream = ReaderStream::with_capacity(file.take(length), chunk_size);

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| Error::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn partial(start: u64, end: u64, total: u64) -> RangePlan {
        RangePlan::Partial(ByteRange { start, end, total })
    }

    #[test]
    fn test_parse_range_header() {
        assert_eq!(parse_range_header("bytes=0-499"), Some((0, Some(499))));
        assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
        assert_eq!(parse_range_header("bytes=5-9, 20-30"), Some((5, Some(9))));
        assert_eq!(parse_range_header("bytes=100-abc"), Some((100, None)));
        assert_eq!(parse_range_header("bytes=-500"), None);
        assert_eq!(parse_range_header("bytes=abc-def"), None);
        assert_eq!(parse_range_header("items=0-1"), None);
        assert_eq!(parse_range_header("bytes=10"), None);
    }

    #[test]
    fn test_plan_without_header() {
        assert_eq!(plan(None, 1000), RangePlan::Full);
    }

    #[test]
    fn test_plan_explicit_range() {
        assert_eq!(plan(Some("bytes=100-199"), 1000), partial(100, 199, 1000));
    }

    #[test]
    fn test_plan_open_end() {
        assert_eq!(plan(Some("bytes=500-"), 1000), partial(500, 999, 1000));
    }

    #[test]
    fn test_plan_clamps_end() {
        let plan = plan(Some("bytes=900-2000"), 1000);
        assert_eq!(plan, partial(900, 999, 1000));
        if let RangePlan::Partial(range) = plan {
            assert_eq!(range.len(), 100);
            assert_eq!(range.content_range(), "bytes 900-999/1000");
        }
    }

    #[test]
    fn test_plan_start_past_end() {
        assert_eq!(plan(Some("bytes=1000-"), 1000), RangePlan::Unsatisfiable);
        assert_eq!(plan(Some("bytes=5000-6000"), 1000), RangePlan::Unsatisfiable);
    }

    #[test]
    fn test_plan_malformed_is_full() {
        assert_eq!(plan(Some("bytes=abc-"), 1000), RangePlan::Full);
        assert_eq!(plan(Some("bytes=-200"), 1000), RangePlan::Full);
        assert_eq!(plan(Some("garbage"), 1000), RangePlan::Full);
        assert_eq!(plan(Some("bytes=500-100"), 1000), RangePlan::Full);
    }

    #[test]
    fn test_plan_empty_file() {
        assert_eq!(plan(Some("bytes=0-"), 0), RangePlan::Full);
    }

    #[test]
    fn test_plan_last_byte() {
        assert_eq!(plan(Some("bytes=999-999"), 1000), partial(999, 999, 1000));
    }

    fn fixture(len: usize, name: &str) -> (tempfile::TempDir, std::path::PathBuf, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();
        (dir, path, data)
    }

    #[tokio::test]
    async fn test_serve_whole_file() {
        let (_dir, path, data) = fixture(1000, "doc.pdf");
        let resp = serve_file(&path, None, 64, None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "1000");
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(resp.headers()[header::ACCEPT_RANGES], "bytes");
        assert_eq!(resp.headers()[header::PRAGMA], "no-cache");
        assert!(resp.headers().get("X-Content-Duration").is_none());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn test_serve_partial() {
        let (_dir, path, data) = fixture(1000, "clip.mp4");
        let resp = serve_file(&path, Some("bytes=100-199"), 32, Some(12.5))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[header::CONTENT_RANGE], "bytes 100-199/1000");
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "100");
        assert_eq!(resp.headers()["X-Content-Duration"], "12.5");
        assert_eq!(resp.headers()[header::CONTENT_DISPOSITION], "inline");
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), &data[100..200]);
    }

    #[tokio::test]
    async fn test_serve_unknown_duration() {
        let (_dir, path, _) = fixture(10, "clip.mkv");
        let resp = serve_file(&path, None, 32, None).await.unwrap();
        assert_eq!(resp.headers()["X-Content-Duration"], "0");
    }

    #[tokio::test]
    async fn test_serve_unsatisfiable() {
        let (_dir, path, _) = fixture(1000, "clip.mp4");
        let resp = serve_file(&path, Some("bytes=1000-"), 32, None)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[header::CONTENT_RANGE], "bytes */1000");
    }

    #[tokio::test]
    async fn test_serve_missing_file() {
        let err = serve_file(Path::new("/nonexistent/file.mp4"), None, 32, None)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_sequential_ranges_reconstruct_file() {
        let (_dir, path, data) = fixture(1000, "song.mp3");
        let mut rebuilt = Vec::new();
        let mut start = 0;
        while start < 1000 {
            let header = format!("bytes={}-{}", start, start + 299);
            let resp = serve_file(&path, Some(&header), 64, None).await.unwrap();
            assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
            let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            rebuilt.extend_from_slice(&body);
            start += 300;
        }
        assert_eq!(rebuilt, data);
    }
}
