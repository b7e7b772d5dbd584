//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트의 에러 본문은 `{"error": "<message>"}` 형식입니다.
//! 요청 추출 실패도 [`crate::extract`]의 추출기를 통해 같은 형식으로 바뀝니다.
//! 스택 트레이스나 내부 에러 상세는 클라이언트에 노출하지 않습니다.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use library_core::LibraryError;

use crate::auth::AuthError;

/// 에러 응답 본문.
///
/// ```json
/// { "error": "Book not found with id 3" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    /// 추가 상세 정보 (검증 실패 필드 등)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            details: None,
        }
    }

    pub fn with_details(message: impl Into<String>, details: Value) -> Self {
        Self {
            error: message.into(),
            details: Some(details),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error)
    }
}

/// 핸들러 에러.
///
/// 상태 코드와 본문 쌍입니다. `LibraryError`, `AuthError`로부터 변환됩니다.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse::new(message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// `validator` 검증 실패.
    pub fn validation(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiErrorResponse::with_details("Validation failed", details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        let status = match &err {
            LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
            LibraryError::Conflict(_) => StatusCode::CONFLICT,
            LibraryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LibraryError::Forbidden(_) => StatusCode::FORBIDDEN,
            LibraryError::Config(_) | LibraryError::Database(_) | LibraryError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if err.is_client_error() {
            Self::new(status, err.to_string())
        } else {
            error!(error = %err, "Request failed");
            Self::new(status, "Internal server error")
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(err.status_code(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_shape() {
        let json = serde_json::to_string(&ApiErrorResponse::new("Invalid token")).unwrap();
        assert_eq!(json, r#"{"error":"Invalid token"}"#);
    }

    #[test]
    fn test_library_error_status() {
        let cases = [
            (LibraryError::book_not_found(1), StatusCode::NOT_FOUND),
            (LibraryError::Conflict("dup".into()), StatusCode::CONFLICT),
            (LibraryError::InvalidInput("days".into()), StatusCode::BAD_REQUEST),
            (LibraryError::Forbidden("not yours".into()), StatusCode::FORBIDDEN),
            (LibraryError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_server_errors_are_masked() {
        let err = ApiError::from(LibraryError::Database("password=hunter2".into()));
        assert_eq!(err.body.error, "Internal server error");
    }

    #[test]
    fn test_from_auth_error() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.body.error, "Invalid username or password");
    }
}
