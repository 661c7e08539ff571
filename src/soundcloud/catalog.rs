use std::{collections::HashMap, sync::Arc};

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    soundcloud::auth::CredentialProvider,
    types::{
        ApiPlaylist, ApiTrack, PlaylistMetadata, Resolved, SearchCollection, TrackMetadata,
    },
    utils,
};

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 200;
const TRACK_BATCH_SIZE: usize = 50;

/// Typed access to the SoundCloud api-v2 catalog.
///
/// Every request carries the current client id. When the upstream answers
/// 401 the id is invalidated, fetched again and the request is repeated
/// exactly once; whatever the second attempt returns is final.
pub struct CatalogClient {
    pub(super) http: Client,
    pub(super) api_url: String,
    pub(super) web_url: String,
    pub(super) credentials: Arc<CredentialProvider>,
}

impl CatalogClient {
    pub fn new(
        http: Client,
        api_url: impl Into<String>,
        web_url: impl Into<String>,
        credentials: Arc<CredentialProvider>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            web_url: web_url.into(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialProvider> {
        &self.credentials
    }

    /// Searches tracks by free text.
    ///
    /// # Arguments
    ///
    /// * `query` - Search text, at least 2 characters after trimming
    /// * `limit` - Page size, clamped to `1..=200`
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidQuery`] for queries shorter than 2 characters
    /// - [`Error::Upstream`] when the search endpoint answers with a non-success
    ///   status (after the single 401 retry)
    /// - [`Error::NoResults`] when the page holds no tracks
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<TrackMetadata>> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Err(Error::InvalidQuery);
        }

        info!("searching for: {}", query);
        let url = format!("{}/search/tracks", self.api_url);
        let params = [
            ("q", query.to_string()),
            ("limit", limit.clamp(1, MAX_SEARCH_LIMIT).to_string()),
            ("offset", "0".to_string()),
        ];
        let page: SearchCollection = self.get_json(&url, &params).await?;

        let tracks: Vec<TrackMetadata> = page
            .collection
            .into_iter()
            .filter(|item| item.get("kind").and_then(Value::as_str) == Some("track"))
            .filter_map(|item| serde_json::from_value::<ApiTrack>(item).ok())
            .map(|track| track.to_metadata())
            .collect();

        if tracks.is_empty() {
            return Err(Error::NoResults);
        }

        info!("found {} tracks", tracks.len());
        Ok(tracks)
    }

    /// Resolves a public SoundCloud URL into a track or a playlist.
    ///
    /// Playlist stubs (tracks the upstream only lists by id) are hydrated
    /// through the batch tracks endpoint, keeping playlist order.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] when `url` is not under the SoundCloud web origin
    /// - [`Error::ResolutionFailed`] for every upstream or decoding failure
    pub async fn resolve(&self, url: &str) -> Result<Resolved> {
        if !utils::is_soundcloud_url(url, &self.web_url) {
            return Err(Error::InvalidUrl(url.to_string()));
        }

        info!("resolving {}", url);
        self.resolve_inner(url)
            .await
            .map_err(|e| match e {
                Error::ResolutionFailed { .. } => e,
                other => Error::ResolutionFailed {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })
    }

    async fn resolve_inner(&self, url: &str) -> Result<Resolved> {
        let endpoint = format!("{}/resolve", self.api_url);
        let value: Value = self.get_json(&endpoint, &[("url", url.to_string())]).await?;

        match value.get("kind").and_then(Value::as_str) {
            Some("track") => {
                let track: ApiTrack = serde_json::from_value(value)?;
                Ok(Resolved::Track(track.to_metadata()))
            }
            Some("playlist") => {
                let playlist: ApiPlaylist = serde_json::from_value(value)?;
                Ok(Resolved::Playlist(self.hydrate_playlist(playlist).await?))
            }
            other => Err(Error::ResolutionFailed {
                url: url.to_string(),
                reason: format!("unsupported resource kind {:?}", other.unwrap_or("none")),
            }),
        }
    }

    /// Fetches one track including its media transcodings.
    pub async fn track(&self, id: u64) -> Result<ApiTrack> {
        let url = format!("{}/tracks/{}", self.api_url, id);
        self.get_json(&url, &[]).await
    }

    /// Fetches tracks by id in batches, returned in request order. Ids the
    /// upstream no longer knows are left out.
    pub async fn tracks_by_ids(&self, ids: &[u64]) -> Result<Vec<ApiTrack>> {
        let url = format!("{}/tracks", self.api_url);
        let mut found: HashMap<u64, ApiTrack> = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(TRACK_BATCH_SIZE) {
            let joined = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let batch: Vec<ApiTrack> = self.get_json(&url, &[("ids", joined)]).await?;
            found.extend(batch.into_iter().map(|t| (t.id, t)));
        }

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    async fn hydrate_playlist(&self, playlist: ApiPlaylist) -> Result<PlaylistMetadata> {
        let stub_ids: Vec<u64> = playlist
            .tracks
            .iter()
            .filter(|t| t.is_stub())
            .map(|t| t.id)
            .collect();

        let mut hydrated: HashMap<u64, ApiTrack> = if stub_ids.is_empty() {
            HashMap::new()
        } else {
            debug!("hydrating {} playlist stubs", stub_ids.len());
            self.tracks_by_ids(&stub_ids)
                .await?
                .into_iter()
                .map(|t| (t.id, t))
                .collect()
        };

        let tracks: Vec<TrackMetadata> = playlist
            .tracks
            .iter()
            .filter_map(|t| {
                if t.is_stub() {
                    hydrated.remove(&t.id).map(|full| full.to_metadata())
                } else {
                    Some(t.to_metadata())
                }
            })
            .collect();

        Ok(PlaylistMetadata {
            title: playlist.title.unwrap_or_default(),
            track_count: playlist.track_count.unwrap_or(tracks.len() as u64),
            tracks,
        })
    }

    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send_authorized(url, query).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("{url} returned {status}")));
        }
        Ok(response.json::<T>().await?)
    }

    /// Sends an authorized GET, refreshing the client id and retrying once
    /// on 401. The retried response is returned whatever its status.
    pub(super) async fn send_authorized(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Response> {
        let token = self.credentials.get_token().await?;
        let response = self.send(url, query, &token.value).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("client id rejected by {}, refreshing and retrying once", url);
        self.credentials.invalidate_if(&token.value).await;
        let token = self.credentials.get_token().await?;
        self.send(url, query, &token.value).await
    }

    async fn send(&self, url: &str, query: &[(&str, String)], client_id: &str) -> Result<Response> {
        Ok(self
            .http
            .get(url)
            .query(query)
            .query(&[("client_id", client_id)])
            .send()
            .await?)
    }
}
