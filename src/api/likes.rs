use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::{
    api::{ApiError, JsonBody, PathParam},
    server::AppState,
    types::TrackMetadata,
};

#[derive(Debug, Serialize)]
pub struct LikesUpdate {
    message: String,
    count: usize,
}

pub async fn list_likes(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackMetadata>>, ApiError> {
    Ok(Json(state.likes.list().await?))
}

pub async fn add_like(
    State(state): State<AppState>,
    JsonBody(track): JsonBody<TrackMetadata>,
) -> Result<Json<LikesUpdate>, ApiError> {
    let id = track.id;
    let count = state.likes.add(track).await?;
    Ok(Json(LikesUpdate {
        message: format!("Track {id} liked"),
        count,
    }))
}

pub async fn replace_likes(
    State(state): State<AppState>,
    JsonBody(tracks): JsonBody<Vec<TrackMetadata>>,
) -> Result<Json<LikesUpdate>, ApiError> {
    let count = state.likes.replace_all(tracks).await?;
    Ok(Json(LikesUpdate {
        message: "Liked tracks replaced".to_string(),
        count,
    }))
}

pub async fn remove_like(
    State(state): State<AppState>,
    PathParam(id): PathParam<u64>,
) -> Result<Json<LikesUpdate>, ApiError> {
    let count = state.likes.remove(id).await?;
    Ok(Json(LikesUpdate {
        message: format!("Track {id} unliked"),
        count,
    }))
}
