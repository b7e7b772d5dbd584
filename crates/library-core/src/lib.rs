//! # Library Core
//!
//! 도서관 백엔드의 핵심 도메인 모델 및 공통 인프라를 제공합니다:
//! - 도서, 대출 기록, 회원 타입과 역할
//! - 연체료 계산
//! - 설정 관리
//! - 토큰 서명 키 해석
//! - 로깅 인프라
//! - 에러 타입

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod signing_key;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use signing_key::{Environment, KeyOrigin, SigningKey, JWT_SECRET_ENV, MIN_SECRET_LEN};
