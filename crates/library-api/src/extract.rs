//! 에러 본문을 `{"error": ...}`로 맞춘 추출기.
//!
//! axum 기본 추출기는 실패 시 평문 본문을 돌려주므로, 같은 추출을 하되
//! rejection을 [`ApiError`]로 바꿉니다.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON 본문.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// 쿼리 문자열.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// 경로 파라미터.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use crate::error::ApiErrorResponse;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Params {
        count: i64,
    }

    async fn echo(
        ApiPath(id): ApiPath<i64>,
        ApiQuery(params): ApiQuery<Params>,
        ApiJson(payload): ApiJson<Payload>,
    ) -> String {
        format!("{}:{}:{}", id, params.count, payload.name)
    }

    fn app() -> Router {
        Router::new().route("/items/{id}", post(echo))
    }

    async fn error_of(request: Request<Body>) -> (StatusCode, ApiErrorResponse) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_all_extractors_pass_through() {
        let response = app()
            .oneshot(json_request("/items/3?count=2", r#"{"name":"dune"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"3:2:dune");
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_error() {
        let (status, body) = error_of(json_request("/items/3?count=2", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/items/3?count=2")
            .body(Body::from(r#"{"name":"dune"}"#))
            .unwrap();
        let (status, body) = error_of(request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_bad_query_is_json_error() {
        let (status, body) =
            error_of(json_request("/items/3?count=many", r#"{"name":"dune"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_bad_path_is_json_error() {
        let (status, body) =
            error_of(json_request("/items/abc?count=2", r#"{"name":"dune"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.error.is_empty());
    }
}
