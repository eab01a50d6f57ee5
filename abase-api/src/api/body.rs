//! JSON request bodies

use axum::async_trait;
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::Json;

use crate::error::ApiError;

/// `Json<T>` whose rejections render as 400 in the API error shape
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Score {
        score: i64,
    }

    fn json_request(body: &str) -> Request {
        axum::http::Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_valid_body() {
        let ApiJson(score) = ApiJson::<Score>::from_request(json_request(r#"{"score":4}"#), &())
            .await
            .unwrap();
        assert_eq!(score.score, 4);
    }

    #[tokio::test]
    async fn test_wrong_type_is_bad_request() {
        let result = ApiJson::<Score>::from_request(json_request(r#"{"score":true}"#), &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let result = ApiJson::<Score>::from_request(json_request("{"), &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = axum::http::Request::post("/")
            .body(Body::from(r#"{"score":4}"#))
            .unwrap();
        let result = ApiJson::<Score>::from_request(request, &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
