//! Shared HTTP API functionality
//!
//! `auth` holds pure signing functions and secret storage; `middleware`
//! wraps them for axum routers in both services.

pub mod auth;
pub mod middleware;

pub use auth::{load_shared_secret, sign_request, validate_signature, validate_timestamp, SignatureError};
pub use middleware::{
    require_signature, SigningSecret, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    USER_ID_HEADER,
};
