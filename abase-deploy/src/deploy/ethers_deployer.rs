//! `ContractDeployer` backed by an ethers signing client

use abase_common::config::DeployConfig;
use abase_common::ContractKind;
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, U256, U64};
use ethers::utils::to_checksum;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::chain::{ChainError, ContractDeployer, DeploymentReceipt};

type SigningClient = SignerMiddleware<Provider<Http>, LocalWallet>;

pub struct EthersDeployer {
    client: Arc<SigningClient>,
    chain_id: u64,
    gas_limit: U256,
    confirmations: usize,
    confirmation_timeout: Option<Duration>,
}

impl EthersDeployer {
    /// Build a signing client for the configured network
    ///
    /// `private_key` is hex, with or without `0x`.
    pub fn new(config: &DeployConfig, private_key: &str) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(config.effective_rpc_url())
            .map_err(|e| ChainError::Provider(e.to_string()))?;

        let chain_id = config.network.chain_id();
        let wallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::Signer(e.to_string()))?
            .with_chain_id(chain_id);

        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            chain_id,
            gas_limit: U256::from(config.gas_limit),
            confirmations: config.confirmations.max(1),
            confirmation_timeout: config.confirmation_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Address paying for deployments
    pub fn signer_address(&self) -> Address {
        self.client.address()
    }
}

#[async_trait]
impl ContractDeployer for EthersDeployer {
    async fn deploy(
        &self,
        kind: ContractKind,
        bytecode: &[u8],
    ) -> Result<DeploymentReceipt, ChainError> {
        let (max_fee, priority_fee) = self
            .client
            .estimate_eip1559_fees(None)
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?;

        debug!(contract = %kind, %max_fee, %priority_fee, "Fee data");

        // No `to`: contract creation
        let tx = Eip1559TransactionRequest::new()
            .data(Bytes::from(bytecode.to_vec()))
            .gas(self.gas_limit)
            .max_fee_per_gas(max_fee)
            .max_priority_fee_per_gas(priority_fee)
            .chain_id(self.chain_id);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        info!(contract = %kind, tx_hash = %tx_hash, "Deployment transaction submitted");

        let confirmation = pending.confirmations(self.confirmations);
        let receipt = match self.confirmation_timeout {
            Some(limit) => tokio::time::timeout(limit, confirmation)
                .await
                .map_err(|_| ChainError::Timeout {
                    tx_hash: tx_hash.clone(),
                    secs: limit.as_secs(),
                })?,
            None => confirmation.await,
        }
        .map_err(|e| ChainError::Provider(e.to_string()))?
        .ok_or_else(|| ChainError::MissingReceipt {
            tx_hash: tx_hash.clone(),
        })?;

        if receipt.status == Some(U64::zero()) {
            return Err(ChainError::Reverted { tx_hash });
        }

        let address = receipt
            .contract_address
            .ok_or_else(|| ChainError::MissingContractAddress {
                tx_hash: tx_hash.clone(),
            })?;

        Ok(DeploymentReceipt {
            contract_address: to_checksum(&address, None),
            transaction_hash: tx_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used.map(|g| g.as_u64()),
        })
    }
}
