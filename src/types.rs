use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

fn default_streamable() -> bool {
    true
}

/// Snapshot of a SoundCloud track as exposed by the proxy.
///
/// The duration travels as `duration` on the wire because that is the field
/// the web UI reads; `duration_ms` is accepted when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: u64,
    pub url: String,
    pub artist: String,
    pub title: String,
    #[serde(rename = "duration", alias = "duration_ms", default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub playback_count: Option<u64>,
    #[serde(default)]
    pub likes_count: Option<u64>,
    #[serde(default = "default_streamable")]
    pub streamable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    pub title: String,
    pub track_count: u64,
    pub tracks: Vec<TrackMetadata>,
}

/// Outcome of resolving a SoundCloud URL.
#[derive(Debug, Clone)]
pub enum Resolved {
    Track(TrackMetadata),
    Playlist(PlaylistMetadata),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub tracks: Vec<TrackMetadata>,
}

/// A materialized cache file. Only handed out for files that exist and are
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub id: u64,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub files: usize,
    pub bytes: u64,
}

impl CacheStats {
    pub fn size_mb(&self) -> f64 {
        (self.bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub cache_dir: String,
    pub cache_files: usize,
    pub cache_size_mb: f64,
    pub liked_tracks: usize,
    pub credential_obtained_at: Option<String>,
}

#[derive(Tabled)]
pub struct LikedTrackTableRow {
    pub id: u64,
    pub artist: String,
    pub title: String,
    pub duration: String,
    pub cached: String,
}

// ---- SoundCloud api-v2 wire types ----

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPublisherMetadata {
    #[serde(default)]
    pub artist: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscodingFormat {
    pub protocol: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transcoding {
    pub url: String,
    pub format: TranscodingFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMedia {
    #[serde(default)]
    pub transcodings: Vec<Transcoding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    pub id: u64,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub publisher_metadata: Option<ApiPublisherMetadata>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub playback_count: Option<u64>,
    #[serde(default)]
    pub likes_count: Option<u64>,
    #[serde(default)]
    pub streamable: Option<bool>,
    #[serde(default)]
    pub media: Option<ApiMedia>,
}

impl ApiTrack {
    /// Playlists embed only the first few tracks in full; the rest carry
    /// nothing but their id.
    pub fn is_stub(&self) -> bool {
        self.title.is_none()
    }

    pub fn artist(&self) -> String {
        let publisher = self
            .publisher_metadata
            .as_ref()
            .and_then(|p| p.artist.as_deref())
            .filter(|a| !a.trim().is_empty());
        let username = self
            .user
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .filter(|u| !u.trim().is_empty());

        publisher
            .or(username)
            .unwrap_or("Unknown Artist")
            .to_string()
    }

    pub fn to_metadata(&self) -> TrackMetadata {
        TrackMetadata {
            id: self.id,
            url: self.permalink_url.clone().unwrap_or_default(),
            artist: self.artist(),
            title: self.title.clone().unwrap_or_default(),
            duration_ms: self.duration.unwrap_or(0),
            artwork_url: self.artwork_url.clone(),
            playback_count: self.playback_count,
            likes_count: self.likes_count,
            streamable: self.streamable.unwrap_or(true),
        }
    }

    pub fn transcodings(&self) -> &[Transcoding] {
        self.media
            .as_ref()
            .map(|m| m.transcodings.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlaylist {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub track_count: Option<u64>,
    #[serde(default)]
    pub tracks: Vec<ApiTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCollection {
    #[serde(default)]
    pub collection: Vec<Value>,
}

/// Body returned when a transcoding URL is exchanged for a signed media URL.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamLocation {
    pub url: String,
}
