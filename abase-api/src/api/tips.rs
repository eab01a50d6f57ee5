//! Tip endpoints

use abase_common::db::{TipRecord, TipStatus};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::body::ApiJson;
use super::caller::Caller;
use crate::db::tips;
use crate::error::{ApiError, ApiResult};
use crate::services::tipping::{Earnings, TipRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmTipRequest {
    pub transaction_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct ArtistTipsQuery {
    pub status: Option<TipStatus>,
}

#[derive(Debug, Serialize)]
pub struct TipList {
    pub tips: Vec<TipRecord>,
}

/// POST /api/tips
///
/// Stores a pending tip; the client then sends the transfer from its wallet
/// and reports the outcome.
pub async fn create_tip(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<TipRequest>,
) -> ApiResult<(StatusCode, Json<TipRecord>)> {
    let tip = state.tips.create(caller.id(), &request).await?;
    Ok((StatusCode::CREATED, Json(tip)))
}

/// POST /api/tips/:id/confirm
pub async fn confirm_tip(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ConfirmTipRequest>,
) -> ApiResult<Json<TipRecord>> {
    let tip = state
        .tips
        .confirm(caller.id(), &id, &request.transaction_hash)
        .await?;
    Ok(Json(tip))
}

/// POST /api/tips/:id/fail
pub async fn fail_tip(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<TipRecord>> {
    Ok(Json(state.tips.fail(caller.id(), &id).await?))
}

/// GET /api/tips/sent
pub async fn sent_tips(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<TipList>> {
    let tips = tips::list_sent(&state.db, caller.id()).await?;
    Ok(Json(TipList { tips }))
}

/// GET /api/artists/:id/tips?status=
pub async fn artist_tips(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
    Query(query): Query<ArtistTipsQuery>,
) -> ApiResult<Json<TipList>> {
    let tips = tips::list_for_artist(&state.db, &artist_id, query.status).await?;
    Ok(Json(TipList { tips }))
}

/// GET /api/artists/:id/earnings
pub async fn artist_earnings(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
) -> ApiResult<Json<Earnings>> {
    if artist_id.trim().is_empty() {
        return Err(ApiError::BadRequest("artist id is required".to_string()));
    }
    Ok(Json(state.tips.earnings(&artist_id).await?))
}
