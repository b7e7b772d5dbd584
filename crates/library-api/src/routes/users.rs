//! 회원 endpoint.
//!
//! 가입은 공개, 목록/수정/삭제는 ADMIN 전용, 단건 조회는 인증된 회원 누구나.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use library_core::{LibraryError, NewUser, Role, User, UserUpdate};

use super::MessageResponse;
use crate::auth::{hash_password, AuthError};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// 회원 가입 요청.
///
/// 역할은 받지 않습니다. 가입한 회원은 항상 USER입니다.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "password must be 1-128 characters"))]
    pub password: String,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
}

/// 관리자 회원 수정 요청.
///
/// `password`가 비어 있으면 기존 비밀번호를 유지합니다.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub role: Role,
    pub password: Option<String>,
}

/// Argon2 해싱을 블로킹 스레드에서 실행.
async fn hash_off_thread(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| ApiError::from(AuthError::Internal(e.to_string())))
}

/// POST /api/users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<Json<User>> {
    request.validate().map_err(ApiError::validation)?;

    let password_hash = hash_off_thread(request.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            username: request.username,
            email: request.email.unwrap_or_default(),
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "User registered");
    Ok(Json(user))
}

/// GET /api/users/all
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<User>> {
    state
        .store
        .find_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| LibraryError::user_not_found(id).into())
}

/// PUT /api/users/admin/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    request.validate().map_err(ApiError::validation)?;

    let password_hash = match request.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_off_thread(password).await?),
        None => None,
    };

    let user = state
        .store
        .update_user(
            id,
            UserUpdate {
                username: request.username,
                email: request.email.unwrap_or_default(),
                role: request.role,
                password_hash,
            },
        )
        .await?;

    info!(user_id = id, role = %user.role, "User updated");
    Ok(Json(user))
}

/// DELETE /api/users/admin/{id}
///
/// 회원의 대출 기록도 함께 삭제됩니다.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.delete_user(id).await?;
    info!(user_id = id, "User deleted");
    Ok(Json(MessageResponse::new(format!(
        "User with id {} deleted successfully",
        id
    ))))
}

/// 회원 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/all", get(list_users))
        .route("/admin/{id}", put(update_user).delete(delete_user))
        .route("/{id}", get(get_user))
}
