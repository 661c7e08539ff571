use axum::body::Bytes;
use futures_util::{StreamExt, TryStreamExt, stream::BoxStream};
use reqwest::Client;
use tracing::debug;

use crate::{
    error::{Error, Result},
    soundcloud::catalog::CatalogClient,
    types::{ApiTrack, StreamLocation, Transcoding},
    utils,
};

/// A lazily produced sequence of audio bytes.
pub type AudioStream = BoxStream<'static, Result<Bytes>>;

/// Orders transcodings by preference: progressive before HLS, MPEG before
/// anything else. Unknown protocols are never picked.
fn transcoding_rank(transcoding: &Transcoding) -> Option<u8> {
    let is_mpeg = transcoding
        .format
        .mime_type
        .as_deref()
        .is_some_and(|m| m.contains("mpeg"));
    match (transcoding.format.protocol.as_str(), is_mpeg) {
        ("progressive", true) => Some(0),
        ("progressive", false) => Some(1),
        ("hls", true) => Some(2),
        ("hls", false) => Some(3),
        _ => None,
    }
}

pub fn pick_transcoding(transcodings: &[Transcoding]) -> Option<&Transcoding> {
    transcodings
        .iter()
        .filter_map(|t| transcoding_rank(t).map(|rank| (rank, t)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, t)| t)
}

impl CatalogClient {
    /// Opens the audio payload of `track` as a byte stream.
    ///
    /// The transcoding URL is first exchanged for a signed media URL. A
    /// progressive transcoding streams the response body as it arrives; an
    /// HLS transcoding fetches the media playlist and yields its segments one
    /// after another.
    ///
    /// # Errors
    ///
    /// [`Error::DownloadFailed`] when the track has no usable transcoding or
    /// uses encrypted HLS, and the usual upstream errors for failed requests.
    pub async fn audio_stream(&self, track: &ApiTrack) -> Result<AudioStream> {
        let transcoding = pick_transcoding(track.transcodings())
            .ok_or_else(|| Error::download_failed(track.id, "no playable transcoding"))?;

        let location: StreamLocation = self.get_json(&transcoding.url, &[]).await?;
        debug!(
            "track {} uses {} transcoding",
            track.id, transcoding.format.protocol
        );

        if transcoding.format.protocol == "hls" {
            return self.hls_stream(track.id, &location.url).await;
        }

        let response = self
            .http
            .get(&location.url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes_stream().map_err(Error::from).boxed())
    }

    async fn hls_stream(&self, id: u64, playlist_url: &str) -> Result<AudioStream> {
        let playlist = self
            .http
            .get(playlist_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if playlist
            .lines()
            .any(|l| l.starts_with("#EXT-X-KEY") && !l.contains("METHOD=NONE"))
        {
            return Err(Error::download_failed(id, "encrypted HLS stream"));
        }

        let segments = utils::hls_segment_urls(&playlist, playlist_url);
        if segments.is_empty() {
            return Err(Error::download_failed(id, "HLS playlist has no segments"));
        }

        debug!("track {} has {} HLS segments", id, segments.len());
        let http = self.http.clone();
        Ok(futures_util::stream::iter(segments)
            .then(move |url| fetch_segment(http.clone(), url))
            .boxed())
    }
}

async fn fetch_segment(http: Client, url: String) -> Result<Bytes> {
    Ok(http.get(&url).send().await?.error_for_status()?.bytes().await?)
}
