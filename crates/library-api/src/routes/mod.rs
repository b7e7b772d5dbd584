//! REST API 라우트.
//!
//! # 엔드포인트
//!
//! - `/health` - 헬스 체크
//! - `/auth/login` - 로그인
//! - `/api/books` - 도서 카탈로그
//! - `/api/borrows` - 대출/반납
//! - `/api/users` - 회원 관리

pub mod auth;
pub mod books;
pub mod borrows;
pub mod health;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    middleware, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use auth::auth_router;
pub use books::books_router;
pub use borrows::borrows_router;
pub use health::health_router;
pub use users::users_router;

use crate::auth::{authenticate, authorize};
use crate::state::AppState;

/// 요청 타임아웃.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 단순 메시지 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 상태가 주입되지 않은 API 라우터.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/auth", auth_router())
        .nest("/api/books", books_router())
        .nest("/api/borrows", borrows_router())
        .nest("/api/users", users_router())
}

/// 인증/인가 미들웨어가 적용된 라우터.
///
/// 나중에 추가한 layer가 바깥쪽이므로 `authenticate`가 `authorize`보다 먼저 실행됩니다.
pub fn secured_router(state: Arc<AppState>) -> Router {
    create_api_router()
        .layer(middleware::from_fn_with_state(state.clone(), authorize))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

/// 전체 라우터 생성.
///
/// CORS가 가장 바깥이므로 preflight 요청은 인증 단계에 도달하지 않습니다.
pub fn create_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    secured_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(cors_layer(cors_origins))
}

/// CORS 레이어 생성.
///
/// origin 목록이 비어 있으면 개발 모드로 간주하여 모든 origin과 헤더를 허용합니다.
/// 목록이 있으면 해당 origin만 허용하고 자격 증명을 포함할 수 있습니다.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(3600));

    if parsed.is_empty() {
        if !origins.is_empty() {
            warn!("server.cors_origins contains no valid origins, allowing any");
        } else {
            warn!("server.cors_origins not set, allowing any origin (development mode)");
        }
        layer
            .allow_origin(AllowOrigin::any())
            .allow_headers(AllowHeaders::any())
    } else {
        info!("CORS configured with {} allowed origins", parsed.len());
        layer
            .allow_origin(AllowOrigin::list(parsed))
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .allow_credentials(true)
    }
}
