use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get},
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{
    Res, api,
    config::Settings,
    management::{CacheStore, DownloadCoordinator, LikesStore, Precacher},
    soundcloud::{self, CatalogClient, CredentialProvider},
};

/// Everything a request handler may touch. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub catalog: Arc<CatalogClient>,
    pub cache: CacheStore,
    pub downloads: DownloadCoordinator,
    pub likes: Arc<LikesStore>,
}

impl AppState {
    pub fn credentials(&self) -> &Arc<CredentialProvider> {
        self.catalog.credentials()
    }
}

/// Wires the components together for `settings`.
///
/// Opens (and sweeps) the cache directory; nothing is fetched from upstream
/// until the first request needs a client id.
pub async fn build_state(settings: Settings) -> Res<AppState> {
    let cache = CacheStore::open(&settings.cache_dir).await?;
    assemble_state(settings, cache)
}

/// Same as [`build_state`] over an existing cache store, without touching
/// the cache directory. Used by CLI commands that may run next to a live
/// server and must not sweep its partial downloads.
pub fn assemble_state(settings: Settings, cache: CacheStore) -> Res<AppState> {
    let http = soundcloud::http_client()?;
    let credentials = Arc::new(CredentialProvider::new(
        http.clone(),
        settings.web_url.clone(),
        settings.client_id.clone(),
    ));
    let catalog = Arc::new(CatalogClient::new(
        http,
        settings.api_url.clone(),
        settings.web_url.clone(),
        credentials,
    ));

    let downloads = DownloadCoordinator::new(cache.clone(), Arc::clone(&catalog));
    let precacher = Precacher::new(downloads.clone(), settings.precache_concurrency);
    let likes = Arc::new(LikesStore::new(
        settings.likes_path(),
        cache.clone(),
        precacher,
    ));

    Ok(AppState {
        settings: Arc::new(settings),
        catalog,
        cache,
        downloads,
        likes,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/search", get(api::search))
        .route("/track-info", get(api::track_info))
        .route("/stream", get(api::stream))
        .route("/download", get(api::download))
        .route("/playlist", get(api::playlist))
        .route(
            "/likes",
            get(api::list_likes)
                .post(api::add_like)
                .put(api::replace_likes),
        )
        .route("/likes/{id}", delete(api::remove_like))
        .route("/cache", delete(api::clear_cache))
        .route("/cache/{id}", delete(api::delete_cached))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_api_server(settings: Settings) -> Res<()> {
    let addr = settings.socket_addr()?;
    let state = build_state(settings).await?;

    info!("cache directory: {}", state.cache.dir().display());
    info!("liked tracks file: {}", state.likes.path().display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
