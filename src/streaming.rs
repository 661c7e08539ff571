//! Range-aware file responses for cached audio.
//!
//! Only the single-range `bytes=<start>-<end?>` form is honored. Anything
//! else in a `Range` header (suffix ranges, multiple ranges, other units)
//! is ignored and the whole file is sent, which HTTP allows.

use std::{io::SeekFrom, path::Path};

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::{
    error::{Error, Result},
    utils,
};

pub const CHUNK_SIZE: usize = 64 * 1024;
const AUDIO_MIME: &str = "audio/mpeg";

/// An inclusive byte range already validated against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// What a `Range` header asks of a file of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

/// Interprets a `Range` header against a file of `size` bytes.
///
/// ```text
/// bytes=0-        -> Partial(0..=size-1)
/// bytes=100-199   -> Partial(100..=199)
/// bytes=100-99999 -> Partial(100..=size-1)
/// bytes=<size>-   -> Unsatisfiable
/// bytes=-500      -> Full
/// ```
pub fn parse_range(header: Option<&str>, size: u64) -> RangeRequest {
    let Some((start, end)) = header.and_then(parse_bytes_spec) else {
        return RangeRequest::Full;
    };

    if start >= size {
        return RangeRequest::Unsatisfiable;
    }

    let last = size - 1;
    let end = end.map_or(last, |end| end.min(last));
    RangeRequest::Partial(ByteRange { start, end })
}

fn parse_bytes_spec(header: &str) -> Option<(u64, Option<u64>)> {
    let spec = header.trim().strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }

    let (start, end) = spec.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    let end = match end.trim() {
        "" => None,
        end => Some(end.parse::<u64>().ok()?),
    };

    if end.is_some_and(|end| end < start) {
        return None;
    }
    Some((start, end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// Serves `path` as `audio/mpeg`, honoring a single byte range.
///
/// The body is read lazily in [`CHUNK_SIZE`] chunks; dropping the response
/// body closes the file.
///
/// # Errors
///
/// - [`Error::RangeNotSatisfiable`] when the range starts past the end of file
/// - [`Error::Io`] when the file cannot be opened or seeked
pub async fn serve_file(
    path: &Path,
    disposition: Disposition,
    artist: &str,
    title: &str,
    range: Option<&str>,
) -> Result<Response> {
    let mut file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();

    let content_disposition = utils::content_disposition(
        disposition.as_str(),
        &utils::display_filename(artist, title),
        &utils::safe_filename(artist, title),
    );

    match parse_range(range, size) {
        RangeRequest::Full => {
            let body = Body::from_stream(ReaderStream::with_capacity(file, CHUNK_SIZE));
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, AUDIO_MIME.to_string()),
                    (header::CONTENT_LENGTH, size.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_DISPOSITION, content_disposition),
                ],
                body,
            )
                .into_response())
        }
        RangeRequest::Partial(range) => {
            debug!(
                "serving bytes {}-{}/{} of {}",
                range.start,
                range.end,
                size,
                path.display()
            );
            file.seek(SeekFrom::Start(range.start)).await?;
            let reader = file.take(range.content_length());
            let body = Body::from_stream(ReaderStream::with_capacity(reader, CHUNK_SIZE));
            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, AUDIO_MIME.to_string()),
                    (header::CONTENT_LENGTH, range.content_length().to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (
                        header::CONTENT_RANGE,
                        format!("bytes {}-{}/{}", range.start, range.end, size),
                    ),
                    (header::CONTENT_DISPOSITION, content_disposition),
                ],
                body,
            )
                .into_response())
        }
        RangeRequest::Unsatisfiable => Err(Error::RangeNotSatisfiable { size }),
    }
}
