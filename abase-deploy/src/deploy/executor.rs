//! Sequential deployment of a validated request
//!
//! Contracts deploy one at a time in request order. The first failure aborts
//! the request; contracts already confirmed stay on-chain and are only
//! reported in the error log. Nothing here guards against duplicate or
//! concurrent requests.

use abase_common::{ContractKind, Network};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};

use super::{BytecodeRegistry, ContractDeployer, DeployError, ValidatedDeployRequest};
use crate::db::deployments::{insert_deployment, NewDeployment};

/// One entry of the success response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOutcome {
    pub contract_name: ContractKind,
    pub address: String,
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
}

pub struct DeploymentExecutor {
    deployer: Arc<dyn ContractDeployer>,
    bytecode: BytecodeRegistry,
    db: SqlitePool,
    network: Network,
}

impl DeploymentExecutor {
    pub fn new(
        deployer: Arc<dyn ContractDeployer>,
        bytecode: BytecodeRegistry,
        db: SqlitePool,
        network: Network,
    ) -> Self {
        Self {
            deployer,
            bytecode,
            db,
            network,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub async fn execute(
        &self,
        request: ValidatedDeployRequest,
    ) -> Result<Vec<DeploymentOutcome>, DeployError> {
        // Resolve every bytecode before the first transaction goes out
        let mut plan = Vec::with_capacity(request.contracts.len());
        for kind in &request.contracts {
            let code = self
                .bytecode
                .get(*kind)
                .ok_or(DeployError::MissingBytecode(*kind))?;
            plan.push((*kind, code));
        }

        let mut completed: Vec<DeploymentOutcome> = Vec::with_capacity(plan.len());
        for (kind, code) in plan {
            match self.deploy_one(kind, code, &request.deployer_address).await {
                Ok(outcome) => completed.push(outcome),
                Err(e) => {
                    for done in &completed {
                        error!(
                            contract = %done.contract_name,
                            address = %done.address,
                            tx_hash = %done.transaction_hash,
                            "Request aborted after this contract was deployed"
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(completed)
    }

    async fn deploy_one(
        &self,
        kind: ContractKind,
        bytecode: &[u8],
        deployer_address: &str,
    ) -> Result<DeploymentOutcome, DeployError> {
        info!(contract = %kind, network = %self.network, bytes = bytecode.len(), "Deploying contract");

        let receipt = self.deployer.deploy(kind, bytecode).await?;

        let record = NewDeployment {
            contract_name: kind.as_str(),
            contract_address: &receipt.contract_address,
            transaction_hash: &receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            deployer_address,
            network: self.network,
        };

        if let Err(e) = insert_deployment(&self.db, &record).await {
            error!(
                contract = %kind,
                address = %receipt.contract_address,
                tx_hash = %receipt.transaction_hash,
                "Deployment confirmed on-chain but not recorded: {}", e
            );
            return Err(e.into());
        }

        info!(
            contract = %kind,
            address = %receipt.contract_address,
            block = ?receipt.block_number,
            "Contract deployed"
        );

        Ok(DeploymentOutcome {
            contract_name: kind,
            address: receipt.contract_address,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{ChainError, DeploymentReceipt};
    use abase_common::db::init_memory_database;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ADDR: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    /// Succeeds `succeed_first` times, then fails
    struct FlakyDeployer {
        calls: AtomicUsize,
        succeed_first: usize,
    }

    #[async_trait]
    impl ContractDeployer for FlakyDeployer {
        async fn deploy(
            &self,
            _kind: ContractKind,
            _bytecode: &[u8],
        ) -> Result<DeploymentReceipt, ChainError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.succeed_first {
                return Err(ChainError::Provider("connection reset".to_string()));
            }
            Ok(DeploymentReceipt {
                contract_address: format!("0x{:040x}", n + 1),
                transaction_hash: format!("0x{:064x}", n + 1),
                block_number: Some(100 + n as u64),
                gas_used: Some(21_000),
            })
        }
    }

    async fn row_count(db: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM contract_deployments")
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_failure_midway_aborts_without_partial_result() {
        let db = init_memory_database().await.unwrap();
        let deployer = Arc::new(FlakyDeployer {
            calls: AtomicUsize::new(0),
            succeed_first: 1,
        });
        let executor = DeploymentExecutor::new(
            deployer.clone(),
            BytecodeRegistry::embedded().unwrap(),
            db.clone(),
            Network::BaseSepolia,
        );

        let request = ValidatedDeployRequest {
            contracts: vec![ContractKind::ArtistTipping, ContractKind::EventTicketing],
            deployer_address: ADDR.to_string(),
        };
        let result = executor.execute(request).await;

        assert!(matches!(result, Err(DeployError::Chain(_))));
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 2);
        // First contract was confirmed and recorded before the abort
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_missing_bytecode_fails_before_any_transaction() {
        let db = init_memory_database().await.unwrap();
        let deployer = Arc::new(FlakyDeployer {
            calls: AtomicUsize::new(0),
            succeed_first: usize::MAX,
        });
        let mut bytecode = BytecodeRegistry::default();
        bytecode.insert(ContractKind::ArtistTipping, vec![0x00]);

        let executor =
            DeploymentExecutor::new(deployer.clone(), bytecode, db.clone(), Network::Base);
        let request = ValidatedDeployRequest {
            contracts: vec![ContractKind::ArtistTipping, ContractKind::MusicNftFactory],
            deployer_address: ADDR.to_string(),
        };

        let result = executor.execute(request).await;
        assert!(matches!(
            result,
            Err(DeployError::MissingBytecode(ContractKind::MusicNftFactory))
        ));
        assert_eq!(deployer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(row_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_success_returns_outcomes_in_order() {
        let db = init_memory_database().await.unwrap();
        let deployer = Arc::new(FlakyDeployer {
            calls: AtomicUsize::new(0),
            succeed_first: usize::MAX,
        });
        let executor = DeploymentExecutor::new(
            deployer,
            BytecodeRegistry::embedded().unwrap(),
            db.clone(),
            Network::BaseSepolia,
        );

        let outcomes = executor
            .execute(ValidatedDeployRequest {
                contracts: vec![ContractKind::MusicNftFactory, ContractKind::ArtistTipping],
                deployer_address: ADDR.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].contract_name, ContractKind::MusicNftFactory);
        assert_eq!(outcomes[1].contract_name, ContractKind::ArtistTipping);
        assert_eq!(outcomes[0].block_number, Some(100));
        assert_eq!(row_count(&db).await, 2);
    }
}
