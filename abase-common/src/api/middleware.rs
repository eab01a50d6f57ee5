//! Axum middleware enforcing request signatures on protected routes

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use super::auth::{validate_signature, validate_timestamp, SignatureError};

pub const TIMESTAMP_HEADER: &str = "x-abase-timestamp";
pub const SIGNATURE_HEADER: &str = "x-abase-signature";

/// Caller identity forwarded by the gateway; covered by the signature
pub const USER_ID_HEADER: &str = "x-user-id";

/// Body size cap while buffering for signature checks (10MB)
const MAX_SIGNED_BODY: usize = 10 * 1024 * 1024;

/// Shared secret handed to [`require_signature`]; `None` disables checking
#[derive(Clone, Default)]
pub struct SigningSecret(Option<Arc<str>>);

impl SigningSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self(secret.filter(|s| !s.is_empty()).map(Arc::from))
    }

    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }
}

/// Validate timestamp + signature headers against the buffered body
///
/// The signed path includes the query string. The raw `x-user-id` value is
/// signed too, so a captured request cannot be replayed under another identity.
pub async fn require_signature(
    State(secret): State<SigningSecret>,
    request: Request,
    next: Next,
) -> Result<Response, SignatureRejection> {
    let Some(secret) = secret.0.clone() else {
        return Ok(next.run(request).await);
    };

    let (parts, body) = request.into_parts();
    let timestamp = header_timestamp(&parts.headers)?;
    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?
        .to_string();

    let user = match parts.headers.get(USER_ID_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| SignatureError::InvalidSignature)?
            .to_string(),
        None => String::new(),
    };

    validate_timestamp(timestamp, crate::time::now_millis())?;

    let body_bytes = axum::body::to_bytes(body, MAX_SIGNED_BODY)
        .await
        .map_err(|e| SignatureRejection::Body(e.to_string()))?;

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());

    if let Err(e) = validate_signature(
        &signature,
        timestamp,
        parts.method.as_str(),
        path,
        &user,
        &body_bytes,
        &secret,
    ) {
        warn!(method = %parts.method, path = %path, "Rejected request with bad signature");
        return Err(e.into());
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn header_timestamp(headers: &HeaderMap) -> Result<i64, SignatureError> {
    let raw = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;

    raw.parse::<i64>().map_err(|_| SignatureError::InvalidTimestamp {
        timestamp: 0,
        now: crate::time::now_millis(),
        reason: format!("not an integer: {}", raw),
    })
}

/// HTTP rejection for signing failures
#[derive(Debug)]
pub enum SignatureRejection {
    Signature(SignatureError),
    Body(String),
}

impl From<SignatureError> for SignatureRejection {
    fn from(e: SignatureError) -> Self {
        SignatureRejection::Signature(e)
    }
}

impl IntoResponse for SignatureRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SignatureRejection::Signature(SignatureError::DatabaseError(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            SignatureRejection::Signature(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            SignatureRejection::Body(msg) => {
                (StatusCode::BAD_REQUEST, format!("Failed to read body: {}", msg))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::sign_request;
    use axum::{middleware, routing::post, Router};
    use tower::ServiceExt;

    fn app(secret: SigningSecret) -> Router {
        Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn_with_state(secret, require_signature))
    }

    #[tokio::test]
    async fn test_disabled_secret_passes_through() {
        let response = app(SigningSecret::disabled())
            .oneshot(axum::http::Request::post("/echo").body(Body::from("hi")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_headers_rejected() {
        let response = app(SigningSecret::new(Some("s3cret".to_string())))
            .oneshot(axum::http::Request::post("/echo").body(Body::from("hi")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_signature_reaches_handler_with_body() {
        let ts = crate::time::now_millis();
        let sig = sign_request(ts, "POST", "/echo", "", b"hi", "s3cret");
        let request = axum::http::Request::post("/echo")
            .header(TIMESTAMP_HEADER, ts.to_string())
            .header(SIGNATURE_HEADER, sig)
            .body(Body::from("hi"))
            .unwrap();

        let response = app(SigningSecret::new(Some("s3cret".to_string())))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hi");
    }

    #[tokio::test]
    async fn test_tampered_body_rejected() {
        let ts = crate::time::now_millis();
        let sig = sign_request(ts, "POST", "/echo", "", b"hi", "s3cret");
        let request = axum::http::Request::post("/echo")
            .header(TIMESTAMP_HEADER, ts.to_string())
            .header(SIGNATURE_HEADER, sig)
            .body(Body::from("bye"))
            .unwrap();

        let response = app(SigningSecret::new(Some("s3cret".to_string())))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_header_bound_to_signature() {
        let ts = crate::time::now_millis();
        let sig = sign_request(ts, "POST", "/echo", "alice", b"hi", "s3cret");
        let signed = |user: Option<&str>| {
            let mut builder = axum::http::Request::post("/echo")
                .header(TIMESTAMP_HEADER, ts.to_string())
                .header(SIGNATURE_HEADER, sig.clone());
            if let Some(user) = user {
                builder = builder.header(USER_ID_HEADER, user);
            }
            builder.body(Body::from("hi")).unwrap()
        };
        let secret = SigningSecret::new(Some("s3cret".to_string()));

        let response = app(secret.clone()).oneshot(signed(Some("alice"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(secret.clone()).oneshot(signed(Some("mallory"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(secret).oneshot(signed(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_empty_secret_is_disabled() {
        assert!(!SigningSecret::new(Some(String::new())).is_enabled());
        assert!(SigningSecret::new(Some("x".to_string())).is_enabled());
    }
}
