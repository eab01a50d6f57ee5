//! abase-api - AudioBASE application API
//!
//! Discovery proxy, tipping, catalog and social endpoints over the shared
//! database. Default port 5731.

use abase_common::api::{load_shared_secret, SigningSecret};
use abase_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use abase_common::db::init_database;
use abase_common::logging::init_tracing;
use abase_api::services::{DiscoveryClient, TipPolicy, TipService};
use abase_api::{build_router, AppState};
use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "abase-api", version, about = "AudioBASE application API")]
struct Args {
    /// Root folder holding audiobase.db
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Explicit TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port (overrides [api] port)
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
        "Starting AudioBASE API (abase-api) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let root_folder = RootFolderResolver::new("abase-api")
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

    let discovery = DiscoveryClient::new(&config.discovery)?;
    info!(
        nodes = config.discovery.nodes.len(),
        app_name = %config.discovery.app_name,
        "Discovery client ready"
    );

    let policy = TipPolicy::from_config(&config.tipping)?;
    let tips = TipService::new(pool.clone(), Arc::new(policy));

    let state = AppState::new(
        pool,
        SigningSecret::new(shared_secret),
        Arc::new(discovery),
        Arc::new(tips),
    );
    let app = build_router(state);

    let port = args.port.unwrap_or(config.api.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("abase-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
