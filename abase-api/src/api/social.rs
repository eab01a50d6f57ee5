//! Follows, comments, ratings, playlists

use abase_common::db::{Comment, Playlist, PlaylistTrack};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::body::ApiJson;
use super::caller::Caller;
use crate::db::social;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const MAX_COMMENT_CHARS: usize = 1000;
pub const MAX_PLAYLIST_NAME_CHARS: usize = 100;

// ========================================
// Follows
// ========================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub artist_id: String,
    pub following: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowersResponse {
    pub artist_id: String,
    pub count: usize,
    pub followers: Vec<String>,
}

/// POST /api/artists/:id/follow
pub async fn follow_artist(
    State(state): State<AppState>,
    caller: Caller,
    Path(artist_id): Path<String>,
) -> ApiResult<Json<FollowResponse>> {
    if artist_id == caller.id() {
        return Err(ApiError::BadRequest("cannot follow yourself".to_string()));
    }
    social::follow(&state.db, caller.id(), &artist_id).await?;
    Ok(Json(FollowResponse {
        artist_id,
        following: true,
    }))
}

/// DELETE /api/artists/:id/follow
pub async fn unfollow_artist(
    State(state): State<AppState>,
    caller: Caller,
    Path(artist_id): Path<String>,
) -> ApiResult<Json<FollowResponse>> {
    social::unfollow(&state.db, caller.id(), &artist_id).await?;
    Ok(Json(FollowResponse {
        artist_id,
        following: false,
    }))
}

/// GET /api/artists/:id/followers
pub async fn list_followers(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
) -> ApiResult<Json<FollowersResponse>> {
    let followers = social::followers(&state.db, &artist_id).await?;
    Ok(Json(FollowersResponse {
        artist_id,
        count: followers.len(),
        followers,
    }))
}

// ========================================
// Comments
// ========================================

#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
}

/// POST /api/tracks/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path(track_id): Path<String>,
    ApiJson(input): ApiJson<NewComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let body = input.body.trim();
    if body.is_empty() {
        return Err(ApiError::BadRequest("comment body is required".to_string()));
    }
    if body.chars().count() > MAX_COMMENT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "comment exceeds {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    let comment = social::insert_comment(&state.db, caller.id(), &track_id, body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/tracks/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
) -> ApiResult<Json<CommentList>> {
    let comments = social::comments_for_track(&state.db, &track_id).await?;
    Ok(Json(CommentList { comments }))
}

/// DELETE /api/comments/:id (author only)
pub async fn delete_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let comment = social::get_comment(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("comment {}", id)))?;

    if comment.user_id != caller.id() {
        return Err(ApiError::Forbidden("only the author can delete a comment".to_string()));
    }

    social::delete_comment(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========================================
// Ratings
// ========================================

#[derive(Debug, Deserialize)]
pub struct RatingInput {
    pub score: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub track_id: String,
    pub average: Option<f64>,
    pub count: i64,
    /// Caller's own score, when the caller is known
    pub mine: Option<i64>,
}

/// PUT /api/tracks/:id/rating
pub async fn rate_track(
    State(state): State<AppState>,
    caller: Caller,
    Path(track_id): Path<String>,
    ApiJson(input): ApiJson<RatingInput>,
) -> ApiResult<Json<RatingSummary>> {
    if !(1..=5).contains(&input.score) {
        return Err(ApiError::BadRequest("score must be between 1 and 5".to_string()));
    }

    social::upsert_rating(&state.db, caller.id(), &track_id, input.score).await?;
    summary(&state, track_id, Some(caller.id())).await.map(Json)
}

/// GET /api/tracks/:id/rating
pub async fn get_rating(
    State(state): State<AppState>,
    caller: Option<Caller>,
    Path(track_id): Path<String>,
) -> ApiResult<Json<RatingSummary>> {
    let viewer = caller.as_ref().map(Caller::id);
    summary(&state, track_id, viewer).await.map(Json)
}

async fn summary(state: &AppState, track_id: String, viewer: Option<&str>) -> ApiResult<RatingSummary> {
    let (average, count) = social::rating_summary(&state.db, &track_id).await?;
    let mine = match viewer {
        Some(user) => social::user_rating(&state.db, user, &track_id).await?,
        None => None,
    };

    Ok(RatingSummary {
        track_id,
        average,
        count,
        mine,
    })
}

// ========================================
// Playlists
// ========================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    pub name: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrack {
    pub track_id: String,
}

#[derive(Debug, Serialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub tracks: Vec<PlaylistTrack>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistList {
    pub playlists: Vec<Playlist>,
}

/// POST /api/playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(input): ApiJson<NewPlaylist>,
) -> ApiResult<(StatusCode, Json<Playlist>)> {
    let name = input.name.trim();
    if name.is_empty() || name.chars().count() > MAX_PLAYLIST_NAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "playlist name must be 1 to {} characters",
            MAX_PLAYLIST_NAME_CHARS
        )));
    }

    let playlist = social::insert_playlist(&state.db, caller.id(), name, input.is_public).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// GET /api/playlists/mine
pub async fn my_playlists(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<PlaylistList>> {
    let playlists = social::playlists_for_owner(&state.db, caller.id()).await?;
    Ok(Json(PlaylistList { playlists }))
}

/// GET /api/playlists/:id
///
/// Private playlists are reported as missing to everyone but their owner.
pub async fn get_playlist(
    State(state): State<AppState>,
    caller: Option<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Json<PlaylistDetail>> {
    let playlist = social::get_playlist(&state.db, &id)
        .await?
        .filter(|p| p.is_public || caller.as_ref().map(Caller::id) == Some(p.owner_id.as_str()))
        .ok_or_else(|| ApiError::NotFound(format!("playlist {}", id)))?;

    let tracks = social::playlist_tracks(&state.db, &id).await?;
    Ok(Json(PlaylistDetail { playlist, tracks }))
}

/// POST /api/playlists/:id/tracks
pub async fn add_playlist_track(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AddTrack>,
) -> ApiResult<(StatusCode, Json<PlaylistDetail>)> {
    let playlist = owned_playlist(&state, &id, &caller).await?;

    let track_id = input.track_id.trim();
    if track_id.is_empty() {
        return Err(ApiError::BadRequest("trackId is required".to_string()));
    }

    if social::append_track(&state.db, &id, track_id).await?.is_none() {
        return Err(ApiError::Conflict(format!("{} is already on the playlist", track_id)));
    }

    let tracks = social::playlist_tracks(&state.db, &id).await?;
    Ok((StatusCode::CREATED, Json(PlaylistDetail { playlist, tracks })))
}

/// DELETE /api/playlists/:id/tracks/:track_id
pub async fn remove_playlist_track(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, track_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    owned_playlist(&state, &id, &caller).await?;

    if !social::remove_track(&state.db, &id, &track_id).await? {
        return Err(ApiError::NotFound(format!("{} is not on the playlist", track_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_playlist(state: &AppState, id: &str, caller: &Caller) -> ApiResult<Playlist> {
    let playlist = social::get_playlist(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("playlist {}", id)))?;

    if playlist.owner_id != caller.id() {
        // Private playlists stay invisible to other users
        return Err(if playlist.is_public {
            ApiError::Forbidden("only the owner can change a playlist".to_string())
        } else {
            ApiError::NotFound(format!("playlist {}", id))
        });
    }
    Ok(playlist)
}
