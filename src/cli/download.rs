use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Res, config, error,
    management::CacheStore,
    server::{self, AppState},
    success,
    types::Resolved,
    warning,
};

pub async fn download(url: String) {
    let state = match open_state().await {
        Ok(state) => state,
        Err(e) => error!("Cannot set up downloader. Err: {}", e),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Resolving {}...", url));
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let track = match state.catalog.resolve(&url).await {
        Ok(Resolved::Track(track)) => track,
        Ok(Resolved::Playlist(playlist)) => {
            pb.finish_and_clear();
            warning!(
                "{} is a playlist ({} tracks), pass a track URL instead",
                playlist.title,
                playlist.track_count
            );
            return;
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Cannot resolve {}. Err: {}", url, e);
        }
    };

    pb.set_message(format!("Downloading {} - {}...", track.artist, track.title));
    match state.downloads.ensure_cached(&track).await {
        Ok(entry) => {
            pb.finish_and_clear();
            success!(
                "Cached {} - {} ({:.2} MB)",
                track.artist,
                track.title,
                entry.size as f64 / (1024.0 * 1024.0)
            );
            println!("{}", entry.path.display());
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Download failed. Err: {}", e);
        }
    }
}

async fn open_state() -> Res<AppState> {
    let settings = config::Settings::from_env();
    async_fs::create_dir_all(&settings.cache_dir).await?;
    let cache = CacheStore::new(&settings.cache_dir);
    server::assemble_state(settings, cache)
}
