//! POST /deploy-contracts

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::deploy::{DeployError, DeployRequest, DeployResponse};
use crate::AppState;

/// Validate, then deploy each requested contract in order
///
/// Malformed JSON is reported as 400 like any other validation failure.
pub async fn deploy_contracts(
    State(state): State<AppState>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Json<DeployResponse>, DeployError> {
    let Json(request) = payload.map_err(|e| DeployError::MalformedBody(e.body_text()))?;
    let request = request.validate()?;

    info!(
        contracts = ?request.contracts,
        deployer = %request.deployer_address,
        network = %state.executor.network(),
        "Deployment requested"
    );

    let deployments = state.executor.execute(request).await?;

    Ok(Json(DeployResponse {
        success: true,
        deployments,
    }))
}
