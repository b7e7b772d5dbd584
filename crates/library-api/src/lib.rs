//! 도서관 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (도서, 대출, 회원)
//! - JWT 인증 및 역할 기반 인가
//! - 메모리/PostgreSQL 저장소
//! - 헬스 체크 엔드포인트
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 토큰 코덱, 자격 증명 검증, 인증/인가 미들웨어
//! - [`repository`]: 저장소 트레이트와 백엔드
//! - [`bootstrap`]: 저장소 선택, 관리자 계정 생성
//! - [`error`]: API 에러 응답
//! - [`extract`]: JSON 에러 본문을 쓰는 요청 추출기

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod extract;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{AuthError, AuthenticatedPrincipal, AuthorizationPolicy, CurrentUser, TokenCodec};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use repository::{LibraryStore, MemoryStore, PgStore};
pub use routes::{create_api_router, create_router, secured_router};
pub use state::AppState;
