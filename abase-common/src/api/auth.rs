//! Request signing via timestamp and SHA-256 signature
//!
//! Protected requests carry two headers:
//! - `x-abase-timestamp`: Unix epoch milliseconds
//! - `x-abase-signature`: 64 hex chars, SHA-256 of the canonical request
//!   followed by the shared secret
//!
//! The canonical request is `timestamp \n METHOD \n path \n user \n body`,
//! where `user` is the raw `x-user-id` header value (empty when absent). The
//! shared secret is stored in the `settings` table; an empty secret disables
//! checking.
//!
//! This module holds only pure functions and database operations; the axum
//! layer lives in [`super::middleware`].

use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Settings key holding the shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";

/// Maximum age of a signed request
pub const MAX_PAST_SKEW_MS: i64 = 30_000;

/// Maximum clock drift into the future
pub const MAX_FUTURE_SKEW_MS: i64 = 1_000;

/// Signature validation failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { timestamp: i64, now: i64, reason: String },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Load the shared secret, generating one on first start
///
/// A stored empty string is returned as `None` and disables signing.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<Option<String>, SignatureError> {
    let stored: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SHARED_SECRET_KEY)
            .fetch_optional(db)
            .await
            .map_err(|e| SignatureError::DatabaseError(e.to_string()))?;

    match stored {
        Some((value,)) if value.is_empty() => Ok(None),
        Some((value,)) => Ok(Some(value)),
        None => initialize_shared_secret(db).await.map(Some),
    }
}

/// Generate and persist a random 256-bit secret (hex encoded)
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<String, SignatureError> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let secret = hex::encode(bytes);

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SHARED_SECRET_KEY)
        .bind(&secret)
        .execute(db)
        .await
        .map_err(|e| SignatureError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Check a request timestamp against `now` (both Unix ms)
///
/// # Examples
///
/// ```
/// use abase_common::api::auth::validate_timestamp;
///
/// let now = 1_760_000_000_000i64;
/// assert!(validate_timestamp(now - 5_000, now).is_ok());
/// assert!(validate_timestamp(now - 60_000, now).is_err());
/// assert!(validate_timestamp(now + 5_000, now).is_err());
/// ```
pub fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), SignatureError> {
    let diff = now - timestamp;

    if diff > MAX_PAST_SKEW_MS {
        return Err(SignatureError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("{}ms too old (max {}ms)", diff, MAX_PAST_SKEW_MS),
        });
    }

    if diff < -MAX_FUTURE_SKEW_MS {
        return Err(SignatureError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("{}ms in future (max {}ms)", -diff, MAX_FUTURE_SKEW_MS),
        });
    }

    Ok(())
}

/// Compute the signature for a request
///
/// # Examples
///
/// ```
/// use abase_common::api::auth::sign_request;
///
/// let sig = sign_request(1_760_000_000_000, "POST", "/deploy-contracts", "", b"{}", "secret");
/// assert_eq!(sig.len(), 64);
/// ```
pub fn sign_request(
    timestamp: i64,
    method: &str,
    path: &str,
    user: &str,
    body: &[u8],
    secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(path.as_bytes());
    hasher.update(b"\n");
    hasher.update(user.as_bytes());
    hasher.update(b"\n");
    hasher.update(body);
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate a provided signature against the recomputed one
pub fn validate_signature(
    provided: &str,
    timestamp: i64,
    method: &str,
    path: &str,
    user: &str,
    body: &[u8],
    secret: &str,
) -> Result<(), SignatureError> {
    let expected = sign_request(timestamp, method, path, user, body, secret);
    if constant_time_eq(provided.to_ascii_lowercase().as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::InvalidSignature)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_depends_on_every_part() {
        let base = sign_request(1, "POST", "/a", "u1", b"{}", "s");
        assert_ne!(base, sign_request(2, "POST", "/a", "u1", b"{}", "s"));
        assert_ne!(base, sign_request(1, "PUT", "/a", "u1", b"{}", "s"));
        assert_ne!(base, sign_request(1, "POST", "/b", "u1", b"{}", "s"));
        assert_ne!(base, sign_request(1, "POST", "/a", "u2", b"{}", "s"));
        assert_ne!(base, sign_request(1, "POST", "/a", "", b"{}", "s"));
        assert_ne!(base, sign_request(1, "POST", "/a", "u1", b"[]", "s"));
        assert_ne!(base, sign_request(1, "POST", "/a", "u1", b"{}", "t"));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        assert_eq!(
            sign_request(1, "post", "/a", "", b"", "s"),
            sign_request(1, "POST", "/a", "", b"", "s")
        );
    }

    #[test]
    fn test_validate_signature() {
        let sig = sign_request(10, "DELETE", "/api/comments/1", "alice", b"", "secret");
        assert!(validate_signature(&sig, 10, "DELETE", "/api/comments/1", "alice", b"", "secret").is_ok());
        assert!(
            validate_signature(&sig.to_uppercase(), 10, "DELETE", "/api/comments/1", "alice", b"", "secret")
                .is_ok()
        );
        assert!(matches!(
            validate_signature(&sig, 10, "DELETE", "/api/comments/2", "alice", b"", "secret"),
            Err(SignatureError::InvalidSignature)
        ));
        assert!(matches!(
            validate_signature(&sig, 10, "DELETE", "/api/comments/1", "mallory", b"", "secret"),
            Err(SignatureError::InvalidSignature)
        ));
    }

    #[test]
    fn test_timestamp_window_edges() {
        let now = 1_000_000;
        assert!(validate_timestamp(now - MAX_PAST_SKEW_MS, now).is_ok());
        assert!(validate_timestamp(now - MAX_PAST_SKEW_MS - 1, now).is_err());
        assert!(validate_timestamp(now + MAX_FUTURE_SKEW_MS, now).is_ok());
        assert!(validate_timestamp(now + MAX_FUTURE_SKEW_MS + 1, now).is_err());
    }
}
