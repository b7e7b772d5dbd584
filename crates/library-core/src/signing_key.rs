//! 토큰 서명 키 해석.
//!
//! 서명 키는 프로세스 시작 시 한 번만 결정되며, 다음 순서로 후보를 찾습니다:
//!
//! 1. 설정 파일/환경 오버라이드의 `auth.jwt_secret`
//! 2. `JWT_SECRET` 환경변수
//! 3. 내장 개발용 기본 키 (운영 환경에서는 거부)
//!
//! 최소 길이([`MIN_SECRET_LEN`])보다 짧은 후보는 없는 것으로 간주하고 다음 후보로 넘어갑니다.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use crate::error::{LibraryError, LibraryResult};

/// 서명 키 최소 길이 (문자 수).
///
/// 비어 있지 않더라도 이보다 짧은 `auth.jwt_secret`은 경고 후 건너뛰고
/// `JWT_SECRET`을 확인합니다. 개발용 기본 키로 바로 넘어가지 않습니다.
pub const MIN_SECRET_LEN: usize = 32;

/// 서명 키 환경변수 이름.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// 개발용 기본 서명 키. 운영 환경에서는 절대 사용되지 않습니다.
const DEV_DEFAULT_SECRET: &str = "library-dev-signing-key-do-not-use-in-production";

/// 배포 환경.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// 서명 키가 어디서 왔는지.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// 명시적 설정 (`auth.jwt_secret`)
    Config,
    /// `JWT_SECRET` 환경변수
    Environment,
    /// 내장 개발용 기본값
    DevDefault,
}

impl std::fmt::Display for KeyOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyOrigin::Config => write!(f, "config"),
            KeyOrigin::Environment => write!(f, "environment"),
            KeyOrigin::DevDefault => write!(f, "dev-default"),
        }
    }
}

/// 프로세스 전역 서명 키.
///
/// `Debug` 출력에서 비밀 값은 가려집니다.
#[derive(Debug)]
pub struct SigningKey {
    secret: SecretString,
    origin: KeyOrigin,
}

impl SigningKey {
    /// 설정값 → 환경변수 → 개발용 기본값 순서로 서명 키를 결정합니다.
    ///
    /// # Arguments
    ///
    /// * `explicit` - 설정의 `auth.jwt_secret`
    /// * `env_lookup` - 환경변수 조회 함수 (보통 `|k| std::env::var(k).ok()`)
    /// * `environment` - 배포 환경
    ///
    /// # Errors
    ///
    /// 운영 환경에서 개발용 기본 키로 떨어지면 `LibraryError::Config`를 반환합니다.
    pub fn resolve<F>(
        explicit: Option<&SecretString>,
        env_lookup: F,
        environment: Environment,
    ) -> LibraryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = explicit.and_then(|s| usable(s.expose_secret(), KeyOrigin::Config)) {
            return Ok(Self::new(secret, KeyOrigin::Config));
        }

        let from_env = env_lookup(JWT_SECRET_ENV);
        if let Some(secret) = from_env
            .as_deref()
            .and_then(|s| usable(s, KeyOrigin::Environment))
        {
            return Ok(Self::new(secret, KeyOrigin::Environment));
        }

        if environment == Environment::Production {
            return Err(LibraryError::Config(format!(
                "no signing key configured: set auth.jwt_secret or {} (at least {} characters)",
                JWT_SECRET_ENV, MIN_SECRET_LEN
            )));
        }

        warn!("No usable signing key configured, using development default (INSECURE)");
        Ok(Self::new(DEV_DEFAULT_SECRET, KeyOrigin::DevDefault))
    }

    /// 테스트/도구용 직접 생성.
    ///
    /// # Errors
    ///
    /// 최소 길이보다 짧으면 `LibraryError::Config`.
    pub fn from_secret(secret: &str) -> LibraryResult<Self> {
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(LibraryError::Config(format!(
                "signing key must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self::new(secret, KeyOrigin::Config))
    }

    fn new(secret: &str, origin: KeyOrigin) -> Self {
        Self {
            secret: SecretString::from(secret.to_string()),
            origin,
        }
    }

    /// 서명/검증에 쓰는 원본 바이트.
    pub fn expose_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }

    /// 키 출처.
    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }

    /// 개발용 기본 키인지 여부.
    pub fn is_dev_default(&self) -> bool {
        self.origin == KeyOrigin::DevDefault
    }
}

fn usable(candidate: &str, origin: KeyOrigin) -> Option<&str> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() < MIN_SECRET_LEN {
        warn!(
            source = %origin,
            min_len = MIN_SECRET_LEN,
            "Signing key candidate too short, ignoring"
        );
        return None;
    }
    Some(trimmed)
}
