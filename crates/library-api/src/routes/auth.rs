//! 로그인 endpoint.
//!
//! `POST /auth/login` - 자격 증명을 확인하고 1시간짜리 토큰을 발급합니다.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{verify_credentials, AuthError};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 로그인 요청.
///
/// 필드가 빠지면 400을 반환하기 위해 둘 다 `Option`으로 받습니다.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// 로그인.
///
/// POST /auth/login
///
/// - 200 `{"token": "..."}`
/// - 400 필드 누락
/// - 401 비밀번호 불일치
/// - 404 등록되지 않은 사용자
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(ApiError::bad_request("Username and password cannot be null"));
    };

    let user = verify_credentials(state.store.as_ref(), &username, &password).await?;
    let token = state
        .codec
        .issue(&user.username, user.role)
        .map_err(AuthError::from)?;

    info!(username = %user.username, role = %user.role, "User logged in");
    Ok(Json(LoginResponse { token }))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}
