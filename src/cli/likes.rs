use tabled::Table;

use crate::{
    config, error,
    management::CacheStore,
    server, success,
    types::LikedTrackTableRow,
    utils, warning,
};

pub async fn likes() {
    let settings = config::Settings::from_env();
    let cache = CacheStore::new(&settings.cache_dir);
    let state = match server::assemble_state(settings, cache) {
        Ok(state) => state,
        Err(e) => error!("Cannot open liked tracks. Err: {}", e),
    };

    let liked = match state.likes.list().await {
        Ok(liked) => liked,
        Err(e) => error!(
            "Failed to read {}. Err: {}",
            state.likes.path().display(),
            e
        ),
    };

    if liked.is_empty() {
        warning!("No liked tracks yet.");
        return;
    }

    let mut rows = Vec::with_capacity(liked.len());
    let mut cached = 0;
    for track in liked {
        let is_cached = state.cache.exists_and_valid(track.id).await;
        if is_cached {
            cached += 1;
        }
        rows.push(LikedTrackTableRow {
            id: track.id,
            artist: track.artist,
            title: track.title,
            duration: utils::format_duration(track.duration_ms),
            cached: if is_cached { "yes" } else { "no" }.to_string(),
        });
    }

    let total = rows.len();
    println!("{}", Table::new(rows));
    success!("{} liked tracks, {} cached", total, cached);
}
