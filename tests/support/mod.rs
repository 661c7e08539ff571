#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path as UrlPath, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use soundnext::{config::Settings, types::TrackMetadata};

pub const AUDIO_LEN: usize = 200_000;
pub const EMPTY_AUDIO_ID: u64 = 666;
pub const NOT_STREAMABLE_ID: u64 = 403;
pub const PLAYLIST_TRACK_IDS: [u64; 3] = [11, 12, 13];
/// Audio that breaks off after `AUDIO_LEN / 2` bytes.
pub const BROKEN_AUDIO_ID: u64 = 502;
/// Tracks that only offer an HLS transcoding.
pub const HLS_TRACK_ID: u64 = 700;
pub const ENCRYPTED_HLS_ID: u64 = 701;
pub const HLS_SEGMENTS: u8 = 3;

/// Request counters of the fake upstream.
#[derive(Default)]
pub struct Hits {
    pub landing: AtomicUsize,
    pub scripts: AtomicUsize,
    pub search: AtomicUsize,
    pub resolve: AtomicUsize,
    pub tracks: AtomicUsize,
    pub media: AtomicUsize,
    pub audio: AtomicUsize,
    pub hls: AtomicUsize,
    pub segments: AtomicUsize,
}

impl Hits {
    pub fn total(&self) -> usize {
        [
            &self.landing,
            &self.scripts,
            &self.search,
            &self.resolve,
            &self.tracks,
            &self.media,
            &self.audio,
            &self.hls,
            &self.segments,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

#[derive(Clone)]
struct Fake {
    base: String,
    hits: Arc<Hits>,
    rejected_client_id: Option<String>,
}

/// An in-process stand-in for both soundcloud.com and api-v2.
pub struct FakeSoundCloud {
    pub base: String,
    pub hits: Arc<Hits>,
}

/// The client id served by the n-th fetch of the bundle script.
pub fn client_id(scrape: usize) -> String {
    format!("{}{}", "a".repeat(31), scrape % 10)
}

pub fn audio_payload() -> Vec<u8> {
    (0..AUDIO_LEN).map(|i| (i % 251) as u8).collect()
}

pub fn hls_segment(n: u8) -> Vec<u8> {
    vec![n + 1; 10_000]
}

/// What the HLS tracks decode to: every segment, in playlist order.
pub fn hls_payload() -> Vec<u8> {
    (0..HLS_SEGMENTS).flat_map(hls_segment).collect()
}

impl FakeSoundCloud {
    pub async fn start() -> Self {
        Self::start_with(None).await
    }

    /// Starts a fake that answers 401 to every request carrying
    /// `rejected_client_id`.
    pub async fn start_with(rejected_client_id: Option<String>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(Hits::default());

        let fake = Fake {
            base: base.clone(),
            hits: Arc::clone(&hits),
            rejected_client_id,
        };

        let app = Router::new()
            .route("/", get(landing))
            .route("/assets/app.js", get(script))
            .route("/search/tracks", get(search))
            .route("/resolve", get(resolve))
            .route("/tracks", get(tracks_by_ids))
            .route("/tracks/{id}", get(track))
            .route("/media/{id}", get(media))
            .route("/audio/{id}", get(audio))
            .route("/hls/{id}", get(hls_playlist))
            .route("/segments/{id}/{n}", get(segment))
            .with_state(fake);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base, hits }
    }

    pub fn settings(&self, root: &Path) -> Settings {
        Settings {
            server_addr: "127.0.0.1:0".to_string(),
            web_url: self.base.clone(),
            api_url: self.base.clone(),
            client_id: None,
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
            precache_concurrency: 2,
        }
    }

    pub fn track_url(&self, id: u64) -> String {
        format!("{}/artist/track-{}", self.base, id)
    }

    pub fn playlist_url(&self) -> String {
        format!("{}/artist/sets/mix", self.base)
    }

    pub fn track(&self, id: u64) -> TrackMetadata {
        TrackMetadata {
            id,
            url: self.track_url(id),
            artist: "Björk".to_string(),
            title: format!("Track {id}"),
            duration_ms: 180_000,
            artwork_url: None,
            playback_count: Some(1),
            likes_count: Some(2),
            streamable: id != NOT_STREAMABLE_ID,
        }
    }

    pub fn hit(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn track_json(base: &str, id: u64) -> Value {
    let hls = json!({
        "url": format!("{base}/media/{id}?kind=hls"),
        "format": { "protocol": "hls", "mime_type": "audio/mpeg" }
    });
    let transcodings = if id == HLS_TRACK_ID || id == ENCRYPTED_HLS_ID {
        vec![hls]
    } else {
        vec![
            hls,
            json!({
                "url": format!("{base}/media/{id}"),
                "format": { "protocol": "progressive", "mime_type": "audio/mpeg" }
            }),
        ]
    };

    json!({
        "id": id,
        "kind": "track",
        "permalink_url": format!("{base}/artist/track-{id}"),
        "title": format!("Track {id}"),
        "user": { "username": "uploader" },
        "publisher_metadata": { "artist": "Björk" },
        "duration": 180000,
        "artwork_url": null,
        "playback_count": 1,
        "likes_count": 2,
        "streamable": id != NOT_STREAMABLE_ID,
        "media": { "transcodings": transcodings }
    })
}

impl Fake {
    fn authorize(&self, params: &HashMap<String, String>) -> Result<(), Response> {
        match params.get("client_id") {
            None => Err(StatusCode::UNAUTHORIZED.into_response()),
            Some(id) if Some(id) == self.rejected_client_id.as_ref() => {
                Err(StatusCode::UNAUTHORIZED.into_response())
            }
            Some(_) => Ok(()),
        }
    }
}

async fn landing(State(fake): State<Fake>) -> Html<String> {
    fake.hits.landing.fetch_add(1, Ordering::SeqCst);
    Html(
        r#"<html><head>
            <script src="/assets/missing.js"></script>
            <script crossorigin src="/assets/app.js"></script>
        </head><body></body></html>"#
            .to_string(),
    )
}

async fn script(State(fake): State<Fake>) -> String {
    let n = fake.hits.scripts.fetch_add(1, Ordering::SeqCst);
    format!(
        "var build=\"{}\";e.exports={{client_id:\"{}\"}};",
        "f".repeat(40) + "1",
        client_id(n)
    )
}

async fn search(
    State(fake): State<Fake>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.hits.search.fetch_add(1, Ordering::SeqCst);
    if let Err(rejected) = fake.authorize(&params) {
        return rejected;
    }

    let q = params.get("q").cloned().unwrap_or_default();
    let collection = if q == "nothing" {
        vec![]
    } else {
        vec![
            track_json(&fake.base, 1),
            json!({ "kind": "user", "id": 99, "username": "someone" }),
            track_json(&fake.base, 2),
        ]
    };
    Json(json!({ "collection": collection })).into_response()
}

async fn resolve(
    State(fake): State<Fake>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.hits.resolve.fetch_add(1, Ordering::SeqCst);
    if let Err(rejected) = fake.authorize(&params) {
        return rejected;
    }

    let url = params.get("url").cloned().unwrap_or_default();
    if url.ends_with("/sets/mix") {
        let [first, second, third] = PLAYLIST_TRACK_IDS;
        return Json(json!({
            "kind": "playlist",
            "title": "Mix",
            "track_count": 3,
            "tracks": [
                track_json(&fake.base, first),
                { "id": second, "kind": "track" },
                { "id": third, "kind": "track" }
            ]
        }))
        .into_response();
    }

    match url.rsplit_once("/track-").and_then(|(_, id)| id.parse::<u64>().ok()) {
        Some(id) => Json(track_json(&fake.base, id)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn tracks_by_ids(
    State(fake): State<Fake>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.hits.tracks.fetch_add(1, Ordering::SeqCst);
    if let Err(rejected) = fake.authorize(&params) {
        return rejected;
    }

    // answered out of order on purpose
    let mut tracks: Vec<Value> = params
        .get("ids")
        .map(|ids| ids.split(',').filter_map(|id| id.parse::<u64>().ok()).collect())
        .unwrap_or_else(Vec::new)
        .into_iter()
        .map(|id| track_json(&fake.base, id))
        .collect();
    tracks.reverse();
    Json(tracks).into_response()
}

async fn track(
    State(fake): State<Fake>,
    UrlPath(id): UrlPath<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.hits.tracks.fetch_add(1, Ordering::SeqCst);
    if let Err(rejected) = fake.authorize(&params) {
        return rejected;
    }
    Json(track_json(&fake.base, id)).into_response()
}

async fn media(
    State(fake): State<Fake>,
    UrlPath(id): UrlPath<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.hits.media.fetch_add(1, Ordering::SeqCst);
    if let Err(rejected) = fake.authorize(&params) {
        return rejected;
    }
    let url = match params.get("kind").map(String::as_str) {
        Some("hls") => format!("{}/hls/{}", fake.base, id),
        _ => format!("{}/audio/{}", fake.base, id),
    };
    Json(json!({ "url": url })).into_response()
}

async fn audio(State(fake): State<Fake>, UrlPath(id): UrlPath<u64>) -> Response {
    fake.hits.audio.fetch_add(1, Ordering::SeqCst);
    // long enough for concurrent callers to overlap
    tokio::time::sleep(Duration::from_millis(150)).await;
    match id {
        EMPTY_AUDIO_ID => Vec::<u8>::new().into_response(),
        BROKEN_AUDIO_ID => {
            let mut first_half = audio_payload();
            first_half.truncate(AUDIO_LEN / 2);
            let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
                Ok(Bytes::from(first_half)),
                Err(std::io::Error::other("connection reset")),
            ];
            Body::from_stream(futures_util::stream::iter(chunks)).into_response()
        }
        _ => audio_payload().into_response(),
    }
}

async fn hls_playlist(State(fake): State<Fake>, UrlPath(id): UrlPath<u64>) -> String {
    fake.hits.hls.fetch_add(1, Ordering::SeqCst);
    let mut playlist = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n");
    if id == ENCRYPTED_HLS_ID {
        playlist.push_str("#EXT-X-KEY:METHOD=AES-128,URI=\"https://keys.example.com/k\"\n");
    }
    for n in 0..HLS_SEGMENTS {
        playlist.push_str("#EXTINF:10.0,\n");
        // mix absolute and playlist-relative entries
        if n % 2 == 0 {
            playlist.push_str(&format!("{}/segments/{}/{}\n", fake.base, id, n));
        } else {
            playlist.push_str(&format!("/segments/{}/{}\n", id, n));
        }
    }
    playlist.push_str("#EXT-X-ENDLIST\n");
    playlist
}

async fn segment(State(fake): State<Fake>, UrlPath((_id, n)): UrlPath<(u64, u8)>) -> Vec<u8> {
    fake.hits.segments.fetch_add(1, Ordering::SeqCst);
    hls_segment(n)
}
