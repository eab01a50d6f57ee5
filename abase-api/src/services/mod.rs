//! Business logic shared by the handlers

pub mod catalog;
pub mod discovery_client;
pub mod tipping;

pub use discovery_client::{DiscoveryClient, DiscoveryError};
pub use tipping::{TipPolicy, TipService, TipTransport};
