//! abase-deploy - contract deployment executor
//!
//! Deploys the platform contracts with a server-held key and records every
//! confirmed deployment. Default port 5730.

use abase_common::api::{load_shared_secret, SigningSecret};
use abase_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use abase_common::db::init_database;
use abase_common::logging::init_tracing;
use abase_deploy::deploy::{BytecodeRegistry, DeploymentExecutor, EthersDeployer};
use abase_deploy::{build_router, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Environment variable holding the deployer's private key
const PRIVATE_KEY_ENV: &str = "ABASE_DEPLOYER_PRIVATE_KEY";

#[derive(Debug, Parser)]
#[command(name = "abase-deploy", version, about = "AudioBASE contract deployment service")]
struct Args {
    /// Root folder holding audiobase.db
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Explicit TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port (overrides [deploy] port)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, config_source) = TomlConfig::load(args.config.as_deref());

    init_tracing(&config.logging)?;
    config_source.log();

    info!(
        "Starting AudioBASE deployer (abase-deploy) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let root_folder = RootFolderResolver::new("abase-deploy")
        .with_cli_arg(args.root_folder)
        .resolve(&config);
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path).await?;

    let shared_secret = load_shared_secret(&pool).await?;
    if shared_secret.is_none() {
        warn!("Request signing disabled (empty api_shared_secret)");
    }

    let private_key = std::env::var(PRIVATE_KEY_ENV)
        .with_context(|| format!("{} must be set", PRIVATE_KEY_ENV))?;
    let deployer = EthersDeployer::new(&config.deploy, &private_key)?;
    info!(
        network = %config.deploy.network,
        rpc = %config.deploy.effective_rpc_url(),
        signer = ?deployer.signer_address(),
        "Deployer ready"
    );

    let bytecode = BytecodeRegistry::from_config(&config.deploy)?;
    let executor = DeploymentExecutor::new(
        Arc::new(deployer),
        bytecode,
        pool.clone(),
        config.deploy.network,
    );

    let state = AppState::new(
        pool,
        SigningSecret::new(shared_secret),
        Arc::new(executor),
        config.deploy.network,
    );
    let app = build_router(state);

    let port = args.port.unwrap_or(config.deploy.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("abase-deploy listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
