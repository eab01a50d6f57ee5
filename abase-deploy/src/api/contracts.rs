//! Read side: resolved addresses and deployment history

use abase_common::db::DeploymentRecord;
use abase_common::Network;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;

use crate::db::deployments::list_for_network;
use crate::resolver::resolve_addresses;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ContractAddressesResponse {
    pub network: Network,
    pub addresses: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub network: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub network: Network,
    pub deployments: Vec<DeploymentRecord>,
}

/// GET /api/contracts/:network
pub async fn get_contract_addresses(
    State(state): State<AppState>,
    Path(network): Path<String>,
) -> Result<Json<ContractAddressesResponse>, ReadError> {
    let network = parse_network(&network)?;
    let records = list_for_network(&state.db, network).await?;

    Ok(Json(ContractAddressesResponse {
        network,
        addresses: resolve_addresses(&records),
    }))
}

/// GET /api/deployments?network=
///
/// Defaults to the network this instance deploys to.
pub async fn list_deployments(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ReadError> {
    let network = match query.network.as_deref() {
        Some(name) => parse_network(name)?,
        None => state.network,
    };
    let deployments = list_for_network(&state.db, network).await?;

    Ok(Json(HistoryResponse {
        network,
        deployments,
    }))
}

fn parse_network(name: &str) -> Result<Network, ReadError> {
    name.parse::<Network>()
        .map_err(|_| ReadError::UnknownNetwork(name.to_string()))
}

/// Read endpoint errors
#[derive(Debug)]
pub enum ReadError {
    UnknownNetwork(String),
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ReadError {
    fn from(e: sqlx::Error) -> Self {
        ReadError::Database(e)
    }
}

impl IntoResponse for ReadError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ReadError::UnknownNetwork(name) => {
                (StatusCode::BAD_REQUEST, format!("Unknown network: {}", name))
            }
            ReadError::Database(e) => {
                error!("Deployment query failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", e))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
