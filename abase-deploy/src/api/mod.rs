//! HTTP API handlers for abase-deploy

pub mod contracts;
pub mod deploy;
pub mod health;

pub use contracts::{get_contract_addresses, list_deployments};
pub use deploy::deploy_contracts;
pub use health::health_routes;
