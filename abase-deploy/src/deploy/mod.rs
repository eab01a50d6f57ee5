//! Deployment request validation and execution
//!
//! A request names contracts from a fixed allow-list and the address that
//! asked for the deployment. Validation happens entirely before the chain is
//! touched: one bad name rejects the whole request.

use abase_common::chain::is_evm_address;
use abase_common::ContractKind;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub mod bytecode;
pub mod chain;
pub mod ethers_deployer;
pub mod executor;

pub use bytecode::BytecodeRegistry;
pub use chain::{ChainError, ContractDeployer, DeploymentReceipt};
pub use ethers_deployer::EthersDeployer;
pub use executor::{DeploymentExecutor, DeploymentOutcome};

/// Body of `POST /deploy-contracts`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    #[serde(default)]
    pub contracts: Vec<String>,
    #[serde(default)]
    pub deployer_address: String,
}

/// A request that passed validation; contracts keep their request order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDeployRequest {
    pub contracts: Vec<ContractKind>,
    pub deployer_address: String,
}

impl DeployRequest {
    pub fn validate(self) -> Result<ValidatedDeployRequest, DeployError> {
        if self.contracts.is_empty() {
            return Err(DeployError::EmptyContracts);
        }

        let contracts = self
            .contracts
            .iter()
            .map(|name| {
                name.parse::<ContractKind>()
                    .map_err(|_| DeployError::ContractNotAllowed(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !is_evm_address(&self.deployer_address) {
            return Err(DeployError::InvalidDeployerAddress(self.deployer_address));
        }

        Ok(ValidatedDeployRequest {
            contracts,
            deployer_address: self.deployer_address,
        })
    }
}

/// Successful response body
#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub success: bool,
    pub deployments: Vec<DeploymentOutcome>,
}

/// Deployment failures
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("At least one contract must be requested")]
    EmptyContracts,

    #[error("Contract not allowed: {0}")]
    ContractNotAllowed(String),

    #[error("Invalid deployer address: {0}")]
    InvalidDeployerAddress(String),

    #[error("No bytecode available for {0}")]
    MissingBytecode(ContractKind),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DeployError {
    pub fn status(&self) -> StatusCode {
        match self {
            DeployError::MalformedBody(_)
            | DeployError::EmptyContracts
            | DeployError::ContractNotAllowed(_)
            | DeployError::InvalidDeployerAddress(_) => StatusCode::BAD_REQUEST,
            DeployError::MissingBytecode(_) | DeployError::Chain(_) | DeployError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DeployError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Deployment request failed: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
