//! Catalog endpoints: uploads, albums, events, merch, NFT collections and
//! NFT tokens share one route set keyed by `:kind`

use abase_common::db::{CatalogKind, CatalogRecord};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::body::ApiJson;
use super::caller::Caller;
use crate::db::catalog as store;
use crate::error::ApiResult;
use crate::pagination::{Pagination, PAGE_SIZE};
use crate::services::catalog::{self, CreateRecord, UpdateRecord};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct CatalogPage {
    pub kind: CatalogKind,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub records: Vec<CatalogRecord>,
}

#[derive(Debug, Serialize)]
pub struct CatalogList {
    pub kind: CatalogKind,
    pub records: Vec<CatalogRecord>,
}

fn parse_kind(segment: &str) -> ApiResult<CatalogKind> {
    Ok(segment.parse::<CatalogKind>()?)
}

/// GET /api/catalog/:kind?page=
pub async fn list_live(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CatalogPage>> {
    let kind = parse_kind(&kind)?;
    let total = store::count_live(&state.db, kind).await?;
    let pagination = Pagination::for_listing(total, query.page);
    let records = store::list_live(&state.db, kind, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(CatalogPage {
        kind,
        total,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        records,
    }))
}

/// GET /api/catalog/:kind/mine
pub async fn list_mine(
    State(state): State<AppState>,
    caller: Caller,
    Path(kind): Path<String>,
) -> ApiResult<Json<CatalogList>> {
    let kind = parse_kind(&kind)?;
    let records = store::list_owned(&state.db, kind, caller.id()).await?;
    Ok(Json(CatalogList { kind, records }))
}

/// GET /api/catalog/:kind/:id
pub async fn get_record(
    State(state): State<AppState>,
    caller: Option<Caller>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<CatalogRecord>> {
    let kind = parse_kind(&kind)?;
    let viewer = caller.as_ref().map(Caller::id);
    Ok(Json(catalog::get_visible(&state.db, kind, &id, viewer).await?))
}

/// POST /api/catalog/:kind
pub async fn create_record(
    State(state): State<AppState>,
    caller: Caller,
    Path(kind): Path<String>,
    ApiJson(input): ApiJson<CreateRecord>,
) -> ApiResult<(StatusCode, Json<CatalogRecord>)> {
    let kind = parse_kind(&kind)?;
    let record = catalog::create(&state.db, kind, caller.id(), &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/catalog/:kind/:id
pub async fn update_record(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, String)>,
    ApiJson(input): ApiJson<UpdateRecord>,
) -> ApiResult<Json<CatalogRecord>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(catalog::update(&state.db, kind, &id, caller.id(), &input).await?))
}

/// POST /api/catalog/:kind/:id/publish
pub async fn publish_record(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<CatalogRecord>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(catalog::publish(&state.db, kind, &id, caller.id()).await?))
}

/// DELETE /api/catalog/:kind/:id
pub async fn delete_record(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    catalog::delete(&state.db, kind, &id, caller.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
