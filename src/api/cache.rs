use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::{
    api::{ApiError, PathParam},
    error::Error,
    server::AppState,
};

pub async fn delete_cached(
    State(state): State<AppState>,
    PathParam(id): PathParam<u64>,
) -> Result<Json<Value>, ApiError> {
    if !state.cache.delete(id).await? {
        return Err(Error::NotFound("Cached file".to_string()).into());
    }
    Ok(Json(json!({ "message": format!("Cache deleted for track {id}") })))
}

pub async fn clear_cache(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let deleted = state.cache.delete_all().await?;
    Ok(Json(json!({
        "message": format!("Cache cleared: {deleted} files deleted"),
        "deleted": deleted
    })))
}
