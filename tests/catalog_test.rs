mod support;

use std::{
    io,
    sync::{Arc, Mutex},
};

use soundnext::{
    Error, ErrorKind,
    soundcloud::{self, CatalogClient, CredentialProvider, media::pick_transcoding},
    types::{Resolved, Transcoding},
};
use support::{FakeSoundCloud, PLAYLIST_TRACK_IDS, client_id};

fn catalog(fake: &FakeSoundCloud, fixed: Option<String>) -> CatalogClient {
    let http = soundcloud::http_client().unwrap();
    let credentials = Arc::new(CredentialProvider::new(
        http.clone(),
        fake.base.clone(),
        fixed,
    ));
    CatalogClient::new(http, fake.base.clone(), fake.base.clone(), credentials)
}

#[tokio::test]
async fn test_search_refreshes_rejected_client_id_and_retries_once() {
    let fake = FakeSoundCloud::start_with(Some(client_id(0))).await;
    let catalog = catalog(&fake, None);

    let tracks = catalog.search("army of me", 20).await.unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(fake.hit(&fake.hits.search), 2);
    assert_eq!(fake.hit(&fake.hits.landing), 2);
    assert_eq!(fake.hit(&fake.hits.scripts), 2);
    let token = catalog.credentials().current().await.unwrap();
    assert_eq!(token.value, client_id(1));
}

#[tokio::test]
async fn test_second_rejection_is_final() {
    let fixed = format!("{}2", "b".repeat(31));
    let fake = FakeSoundCloud::start_with(Some(fixed.clone())).await;
    let catalog = catalog(&fake, Some(fixed));

    let err = catalog.search("army of me", 20).await.unwrap_err();

    assert!(matches!(err, Error::Upstream(_)), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    assert_eq!(fake.hit(&fake.hits.search), 2);
}

#[tokio::test]
async fn test_fixed_client_id_skips_scraping() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, Some(format!("{}3", "c".repeat(31))));

    catalog.search("army of me", 5).await.unwrap();

    assert_eq!(fake.hit(&fake.hits.landing), 0);
    assert_eq!(fake.hit(&fake.hits.scripts), 0);
}

#[tokio::test]
async fn test_client_id_is_scraped_once() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);
    assert!(catalog.credentials().obtained_at().await.is_none());

    catalog.search("first", 5).await.unwrap();
    catalog.search("second", 5).await.unwrap();

    assert_eq!(fake.hit(&fake.hits.landing), 1);
    assert_eq!(fake.hit(&fake.hits.scripts), 1);
    assert!(catalog.credentials().obtained_at().await.is_some());
}

#[tokio::test]
async fn test_search_keeps_only_tracks() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    let tracks = catalog.search("army of me", 20).await.unwrap();

    let ids: Vec<u64> = tracks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(tracks[0].artist, "Björk");
    assert_eq!(tracks[0].url, fake.track_url(1));
    assert_eq!(tracks[0].duration_ms, 180_000);
}

#[tokio::test]
async fn test_empty_search_is_no_results() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    let err = catalog.search("nothing", 20).await.unwrap_err();

    assert!(matches!(err, Error::NoResults));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_short_query_never_reaches_upstream() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    let err = catalog.search(" a ", 20).await.unwrap_err();

    assert!(matches!(err, Error::InvalidQuery));
    assert_eq!(fake.hits.total(), 0);
}

#[tokio::test]
async fn test_resolve_track() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    match catalog.resolve(&fake.track_url(7)).await.unwrap() {
        Resolved::Track(track) => {
            assert_eq!(track.id, 7);
            assert_eq!(track.title, "Track 7");
            assert!(track.streamable);
        }
        other => panic!("expected a track, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_playlist_hydrates_stubs_in_order() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    let playlist = match catalog.resolve(&fake.playlist_url()).await.unwrap() {
        Resolved::Playlist(playlist) => playlist,
        other => panic!("expected a playlist, got {other:?}"),
    };

    assert_eq!(playlist.title, "Mix");
    assert_eq!(playlist.track_count, 3);
    let ids: Vec<u64> = playlist.tracks.iter().map(|t| t.id).collect();
    assert_eq!(ids, PLAYLIST_TRACK_IDS.to_vec());
    assert!(playlist.tracks.iter().all(|t| !t.title.is_empty()));
    // the two stubs are fetched in a single batch
    assert_eq!(fake.hit(&fake.hits.tracks), 1);
}

#[tokio::test]
async fn test_resolve_rejects_foreign_urls() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    let err = catalog
        .resolve("https://example.com/artist/track-1")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidUrl(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(fake.hits.total(), 0);
}

#[tokio::test]
async fn test_resolve_unknown_url_is_resolution_failure() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    let err = catalog
        .resolve(&format!("{}/artist/unknown", fake.base))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ResolutionFailed { .. }), "{err:?}");
}

#[tokio::test]
async fn test_invalidate_forces_a_new_scrape() {
    let fake = FakeSoundCloud::start().await;
    let catalog = catalog(&fake, None);

    let first = catalog.credentials().get_token().await.unwrap();
    catalog.credentials().invalidate().await;
    assert!(catalog.credentials().current().await.is_none());
    let second = catalog.credentials().get_token().await.unwrap();

    assert_eq!(first.value, client_id(0));
    assert_eq!(second.value, client_id(1));
    assert_eq!(fake.hit(&fake.hits.scripts), 2);

    // a stale token no longer matches, so the fresh one survives
    assert!(!catalog.credentials().invalidate_if(&first.value).await);
    assert_eq!(catalog.credentials().current().await, Some(second));
}

#[test]
fn test_progressive_mpeg_is_preferred() {
    let transcodings: Vec<Transcoding> = serde_json::from_str(
        r#"[
            {"url":"hls-opus","format":{"protocol":"hls","mime_type":"audio/ogg; codecs=\"opus\""}},
            {"url":"hls-mp3","format":{"protocol":"hls","mime_type":"audio/mpeg"}},
            {"url":"progressive","format":{"protocol":"progressive","mime_type":"audio/mpeg"}}
        ]"#,
    )
    .unwrap();

    assert_eq!(pick_transcoding(&transcodings).unwrap().url, "progressive");
    assert_eq!(pick_transcoding(&transcodings[..2]).unwrap().url, "hls-mp3");
    assert!(pick_transcoding(&[]).is_none());
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_fixed_client_id_warns_only_when_rejected() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let fixed = format!("{}4", "d".repeat(31));
    let fake = FakeSoundCloud::start().await;
    let accepted = catalog(&fake, Some(fixed.clone()));
    accepted.credentials().get_token().await.unwrap();
    accepted.credentials().invalidate().await;

    assert_eq!(
        accepted.credentials().current().await.map(|t| t.value),
        Some(fixed.clone())
    );
    assert!(!logs.text().contains("rejected upstream"), "{}", logs.text());

    let rejecting = FakeSoundCloud::start_with(Some(fixed.clone())).await;
    let rejected = catalog(&rejecting, Some(fixed.clone()));
    rejected.search("army of me", 5).await.unwrap_err();

    assert!(logs.text().contains("rejected upstream"), "{}", logs.text());
    assert_eq!(
        rejected.credentials().current().await.map(|t| t.value),
        Some(fixed)
    );
}
