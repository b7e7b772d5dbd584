//! 요청 인증 미들웨어.
//!
//! 요청마다 한 번, 인가 및 핸들러보다 먼저 실행됩니다.
//!
//! 1. `Authorization: Bearer <token>` 헤더가 없으면 인증 없이 통과
//! 2. 토큰에서 사용자 이름 추출. 만료는 401 `Token has expired`,
//!    파싱/서명 실패는 401 `Invalid token`, 그 외 실패는 500
//! 3. 아직 주체가 없으면 토큰 전체를 검증하고 역할을 추출해
//!    [`AuthenticatedPrincipal`]을 request extensions에 설치
//! 4. 다음 단계로 정확히 한 번 전달. 에러 응답을 쓴 뒤에는 전달하지 않음

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::error::AuthError;
use super::principal::AuthenticatedPrincipal;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// `Authorization` 헤더에서 Bearer 토큰 추출.
///
/// 헤더가 없거나 Bearer 형식이 아니면 `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(|token| token.trim().to_string())
}

/// 인증 미들웨어.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return next.run(request).await;
    };

    let username = match state.codec.decode_username(&token) {
        Ok(username) => username,
        Err(e) => {
            let err = AuthError::from(e);
            warn!(path = %request.uri().path(), error = %err, "Rejected bearer token");
            return err.into_response();
        }
    };

    if request.extensions().get::<AuthenticatedPrincipal>().is_none() {
        if !state.codec.validate(&token) {
            warn!(path = %request.uri().path(), "Token failed validation");
            return AuthError::InvalidToken.into_response();
        }

        let role = match state.codec.decode_role(&token) {
            Ok(role) => role,
            Err(e) => return AuthError::from(e).into_response(),
        };

        debug!(username = %username, role = %role, "Principal installed");
        request
            .extensions_mut()
            .insert(AuthenticatedPrincipal::new(username, role));
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        // 소문자 scheme은 Bearer로 보지 않음
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
