use crate::{
    config, error, info,
    management::CacheStore,
    server, success,
};

/// Deletes cached audio of every track that is not liked.
///
/// Refuses to touch the cache when the liked list cannot be read, so a
/// corrupt likes file never wipes liked audio.
pub async fn cache_trim() {
    let settings = config::Settings::from_env();
    let cache = CacheStore::new(&settings.cache_dir);
    let state = match server::assemble_state(settings, cache) {
        Ok(state) => state,
        Err(e) => error!("Cannot open cache. Err: {}", e),
    };

    let keep = match state.likes.ids().await {
        Ok(ids) => ids,
        Err(e) => error!("Cannot read liked tracks, cache left untouched. Err: {}", e),
    };

    match state.cache.retain_only(&keep).await {
        Ok(deleted) => success!(
            "Trimmed cache: {} files deleted, {} liked tracks kept",
            deleted,
            keep.len()
        ),
        Err(e) => error!("Failed to trim cache. Err: {}", e),
    }
}

pub async fn cache_clear() {
    let cache = CacheStore::new(config::cache_dir());
    match cache.delete_all().await {
        Ok(deleted) => success!("Cache cleared: {} files deleted", deleted),
        Err(e) => error!("Failed to clear cache. Err: {}", e),
    }
}

pub async fn cache_stats() {
    let cache = CacheStore::new(config::cache_dir());
    match cache.stats().await {
        Ok(stats) => {
            info!("Cache directory: {}", cache.dir().display());
            info!("Files: {}", stats.files);
            info!("Size: {} MB", stats.size_mb());
        }
        Err(e) => error!("Failed to read cache. Err: {}", e),
    }
}
