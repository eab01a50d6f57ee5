//! # AudioBASE Common Library
//!
//! Shared code for the AudioBASE services:
//! - Database schema and row models
//! - Contract and network identifiers
//! - Request signing for protected routes
//! - Configuration loading and logging setup

pub mod api;
pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod time;

pub use chain::{ContractKind, Network, ZERO_ADDRESS};
pub use error::{Error, Result};
