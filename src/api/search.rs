use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::{
    api::{ApiError, QueryParams},
    server::AppState,
    soundcloud::catalog::DEFAULT_SEARCH_LIMIT,
    types::SearchResult,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<u32>,
}

pub async fn search(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<SearchResult>, ApiError> {
    let tracks = state
        .catalog
        .search(&params.q, params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .await?;
    Ok(Json(SearchResult { tracks }))
}
