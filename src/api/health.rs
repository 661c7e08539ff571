use axum::{extract::State, response::Json};

use crate::{api::ApiError, server::AppState, types::HealthReport};

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthReport>, ApiError> {
    let stats = state.cache.stats().await?;
    let liked_tracks = state.likes.list().await?.len();
    let credential_obtained_at = state
        .credentials()
        .obtained_at()
        .await
        .map(|at| at.to_rfc3339());

    Ok(Json(HealthReport {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        cache_dir: state.cache.dir().display().to_string(),
        cache_files: stats.files,
        cache_size_mb: stats.size_mb(),
        liked_tracks,
        credential_obtained_at,
    }))
}
