use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Json` extractor whose rejections speak the `{success:false, message}`
/// envelope instead of axum's plain-text defaults.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// `Query` extractor with the same enveloped rejections.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct SampleBody {
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct SampleQuery {
        limit: i64,
    }

    fn json_request(body: &'static str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_json_passes_through() {
        let req = json_request(r#"{"name": "x"}"#);
        let ApiJson(parsed) = ApiJson::<SampleBody>::from_request(req, &()).await.unwrap();
        assert_eq!(parsed.name, "x");
    }

    #[tokio::test]
    async fn test_malformed_json_becomes_enveloped_400() {
        let req = json_request("{not json");
        let err = ApiJson::<SampleBody>::from_request(req, &())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_query_string_becomes_enveloped_400() {
        let req = HttpRequest::builder()
            .uri("/things?limit=abc")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let err = ApiQuery::<SampleQuery>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_valid_query_passes_through() {
        let req = HttpRequest::builder()
            .uri("/things?limit=25")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let ApiQuery(parsed) = ApiQuery::<SampleQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(parsed.limit, 25);
    }
}
