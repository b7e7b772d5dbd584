//! 인증 및 권한 부여.
//!
//! JWT 기반 무상태 인증과 역할 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`TokenCodec`]: 토큰 발급 및 검증
//! - [`verify_credentials`]: 로그인 자격 증명 검증
//! - [`authenticate`]: 요청 인증 미들웨어
//! - [`AuthorizationPolicy`] / [`authorize`]: 경로별 역할 정책과 인가 미들웨어
//! - [`CurrentUser`]: 핸들러용 인증 주체 추출기
//!
//! 미들웨어 순서는 `authenticate` → `authorize` → 핸들러입니다.

mod credentials;
mod error;
mod jwt;
mod middleware;
mod password;
mod policy;
mod principal;

pub use credentials::{verify_credentials, UserLookup};
pub use error::AuthError;
pub use jwt::{Claims, TokenCodec, TokenError, DEFAULT_TOKEN_TTL_SECS};
pub use middleware::{authenticate, bearer_token};
pub use password::{hash_password, verify_password, PasswordError};
pub use policy::{authorize, path_matches, Access, AuthorizationPolicy, Decision, Rule};
pub use principal::{AuthenticatedPrincipal, CurrentUser};
