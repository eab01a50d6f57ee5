//! Read-only proxy over the discovery nodes
//!
//! Responses keep the upstream `{"data": ...}` envelope.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::services::discovery_client::{Envelope, TimeRange, Track, User};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub genre: Option<String>,
    pub time: Option<TimeRange>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// GET /api/tracks/trending?genre=&time=
pub async fn trending_tracks(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> ApiResult<Json<Envelope<Vec<Track>>>> {
    let data = state
        .discovery
        .trending_tracks(query.genre.as_deref(), query.time)
        .await?;
    Ok(Json(Envelope { data }))
}

/// GET /api/tracks/search?query=
pub async fn search_tracks(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Envelope<Vec<Track>>>> {
    let text = query.query.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("query is required".to_string()));
    }
    let data = state.discovery.search_tracks(text).await?;
    Ok(Json(Envelope { data }))
}

/// GET /api/tracks/:id
pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Track>>> {
    let data = state.discovery.get_track(&id).await?;
    Ok(Json(Envelope { data }))
}

/// GET /api/tracks/:id/stream
///
/// 302 to the stream on the current node; audio never passes through this
/// service.
pub async fn stream_track(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let url = state.discovery.stream_url(&id)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<User>>> {
    let data = state.discovery.get_user(&id).await?;
    Ok(Json(Envelope { data }))
}

/// GET /api/users/:id/tracks
pub async fn user_tracks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Vec<Track>>>> {
    let data = state.discovery.user_tracks(&id).await?;
    Ok(Json(Envelope { data }))
}
