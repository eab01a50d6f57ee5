//! abase-deploy library - contract deployment executor
//!
//! Serves `POST /deploy-contracts`, which deploys the allow-listed platform
//! contracts and records each receipt, plus the read-side address resolver.

use abase_common::api::{require_signature, SigningSecret};
use abase_common::Network;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod deploy;
pub mod resolver;

use deploy::DeploymentExecutor;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub signing: SigningSecret,
    pub executor: Arc<DeploymentExecutor>,
    /// Network this instance deploys to; default for history queries
    pub network: Network,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        signing: SigningSecret,
        executor: Arc<DeploymentExecutor>,
        network: Network,
    ) -> Self {
        Self {
            db,
            signing,
            executor,
            network,
        }
    }
}

/// Build application router
///
/// The deploy endpoint spends server-held funds and is signed; reads are
/// public. CORS is open to every origin.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/deploy-contracts", post(api::deploy_contracts))
        .layer(middleware::from_fn_with_state(
            state.signing.clone(),
            require_signature,
        ));

    let public = Router::new()
        .route("/api/contracts/:network", get(api::get_contract_addresses))
        .route("/api/deployments", get(api::list_deployments))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
