//! Deployment record store (append-only)

use abase_common::db::DeploymentRecord;
use abase_common::Network;
use sqlx::SqlitePool;

/// Values for a new deployment row; `deployed_at` is set on insert
#[derive(Debug, Clone)]
pub struct NewDeployment<'a> {
    pub contract_name: &'a str,
    pub contract_address: &'a str,
    pub transaction_hash: &'a str,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    pub deployer_address: &'a str,
    pub network: Network,
}

/// Append a deployment record, returning its row id
pub async fn insert_deployment(
    pool: &SqlitePool,
    deployment: &NewDeployment<'_>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO contract_deployments
            (contract_name, contract_address, transaction_hash, block_number,
             gas_used, deployer_address, network, deployed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(deployment.contract_name)
    .bind(deployment.contract_address)
    .bind(deployment.transaction_hash)
    .bind(deployment.block_number.map(|b| b as i64))
    .bind(deployment.gas_used.map(|g| g as i64))
    .bind(deployment.deployer_address)
    .bind(deployment.network.as_str())
    .bind(abase_common::time::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All deployments on `network`, newest first
pub async fn list_for_network(
    pool: &SqlitePool,
    network: Network,
) -> Result<Vec<DeploymentRecord>, sqlx::Error> {
    sqlx::query_as::<_, DeploymentRecord>(
        r#"
        SELECT id, contract_name, contract_address, transaction_hash, block_number,
               gas_used, deployer_address, network, deployed_at
        FROM contract_deployments
        WHERE network = ?
        ORDER BY deployed_at DESC, id DESC
        "#,
    )
    .bind(network.as_str())
    .fetch_all(pool)
    .await
}
