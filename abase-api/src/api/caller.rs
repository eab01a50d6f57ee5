//! Caller identity
//!
//! The fronting gateway authenticates the user and forwards their id in
//! `x-user-id`. On mutating routes the header value is part of the signed
//! request, so swapping it invalidates the signature. Reads are unsigned and
//! only use the header to tailor the response to the viewer.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub use abase_common::api::USER_ID_HEADER;

/// Authenticated user id; rejects with 401 when absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub String);

impl Caller {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;

        let id = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized(format!("{} is not valid text", USER_ID_HEADER)))?
            .trim();

        if id.is_empty() {
            return Err(ApiError::Unauthorized(format!("empty {} header", USER_ID_HEADER)));
        }

        Ok(Caller(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Caller, ApiError> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_trimmed_header() {
        let request = Request::builder()
            .header(USER_ID_HEADER, " user-1 ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().id(), "user-1");
    }

    #[tokio::test]
    async fn test_missing_or_blank_is_unauthorized() {
        let missing = Request::builder().body(()).unwrap();
        assert!(matches!(extract(missing).await, Err(ApiError::Unauthorized(_))));

        let blank = Request::builder().header(USER_ID_HEADER, "  ").body(()).unwrap();
        assert!(matches!(extract(blank).await, Err(ApiError::Unauthorized(_))));
    }
}
