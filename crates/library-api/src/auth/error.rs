//! 인증/인가 에러.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::jwt::TokenError;
use crate::error::ApiErrorResponse;

/// 인증 및 인가 실패.
///
/// 응답 본문은 항상 `{"error": "<message>"}` 형식이며 내부 상세는 포함하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// 만료된 토큰
    #[error("Token has expired")]
    ExpiredToken,
    /// 파싱 불가, 서명 불일치 등
    #[error("Invalid token")]
    InvalidToken,
    /// 로그인 대상 회원 없음
    #[error("User not found")]
    NotFound,
    /// 비밀번호 불일치
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// 권한 부족 또는 미인증
    #[error("Access denied")]
    Forbidden,
    /// 예상치 못한 실패
    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP 상태 코드.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ExpiredToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Malformed => AuthError::InvalidToken,
            TokenError::Internal(message) => AuthError::Internal(message),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ApiErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_token_error() {
        assert_eq!(AuthError::from(TokenError::Expired), AuthError::ExpiredToken);
        assert_eq!(AuthError::from(TokenError::Malformed), AuthError::InvalidToken);
        assert_eq!(
            AuthError::from(TokenError::Internal("x".to_string())),
            AuthError::Internal("x".to_string())
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(AuthError::ExpiredToken.to_string(), "Token has expired");
        assert_eq!(AuthError::InvalidToken.to_string(), "Invalid token");
    }
}
