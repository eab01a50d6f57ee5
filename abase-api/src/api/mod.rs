//! HTTP API handlers for abase-api

pub mod body;
pub mod caller;
pub mod catalog;
pub mod discovery;
pub mod health;
pub mod social;
pub mod tips;

pub use body::ApiJson;
pub use caller::{Caller, USER_ID_HEADER};
pub use health::health_routes;
