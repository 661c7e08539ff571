use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{Json, Response},
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    api::{ApiError, QueryParams},
    error::Error,
    server::AppState,
    streaming::{self, Disposition},
    types::{PlaylistMetadata, Resolved, TrackMetadata},
    utils,
};

#[derive(Debug, Deserialize)]
pub struct UrlParams {
    #[serde(default)]
    url: String,
}

pub async fn track_info(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UrlParams>,
) -> Result<Json<TrackMetadata>, ApiError> {
    Ok(Json(resolve_track(&state, &params.url).await?))
}

pub async fn playlist(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UrlParams>,
) -> Result<Json<PlaylistMetadata>, ApiError> {
    match state.catalog.resolve(&params.url).await? {
        Resolved::Playlist(playlist) => Ok(Json(playlist)),
        Resolved::Track(_) => Err(Error::WrongKind {
            expected: "playlist",
        }
        .into()),
    }
}

pub async fn stream(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UrlParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_track(&state, &params.url, Disposition::Inline, &headers).await
}

pub async fn download(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UrlParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_track(&state, &params.url, Disposition::Attachment, &headers).await
}

async fn resolve_track(state: &AppState, url: &str) -> Result<TrackMetadata, Error> {
    match state.catalog.resolve(url).await? {
        Resolved::Track(track) => Ok(track),
        Resolved::Playlist(_) => Err(Error::WrongKind { expected: "track" }),
    }
}

/// Serves a track from the cache, downloading it first when needed.
///
/// Liked tracks are looked up by URL before anything else, so a liked and
/// cached track is served without talking to SoundCloud at all.
async fn serve_track(
    state: &AppState,
    url: &str,
    disposition: Disposition,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    if !utils::is_soundcloud_url(url, &state.settings.web_url) {
        return Err(Error::InvalidUrl(url.to_string()).into());
    }

    let track = match state.likes.find_by_url(url).await? {
        Some(liked) => {
            debug!("{} is a liked track ({})", url, liked.id);
            liked
        }
        None => resolve_track(state, url).await?,
    };

    let entry = state.downloads.ensure_cached(&track).await?;
    info!(
        "serving {} - {} ({}, {})",
        track.artist,
        track.title,
        entry.path.display(),
        disposition.as_str()
    );

    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    Ok(streaming::serve_file(&entry.path, disposition, &track.artist, &track.title, range).await?)
}
