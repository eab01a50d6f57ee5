//! Chain access seam for the executor

use abase_common::ContractKind;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// What the executor needs back from a confirmed deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    pub contract_address: String,
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Provider(String),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Transaction {tx_hash} dropped before confirmation")]
    MissingReceipt { tx_hash: String },

    #[error("Receipt for {tx_hash} carries no contract address")]
    MissingContractAddress { tx_hash: String },

    #[error("Transaction {tx_hash} not confirmed within {secs}s")]
    Timeout { tx_hash: String, secs: u64 },
}

/// Submits a contract-creation transaction and waits for its receipt
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    async fn deploy(
        &self,
        kind: ContractKind,
        bytecode: &[u8],
    ) -> Result<DeploymentReceipt, ChainError>;
}
