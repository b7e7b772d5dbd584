//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → 설정 파일(선택) → `LIBRARY__` 접두사 환경변수 순서로 덮어씁니다.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

use crate::error::{LibraryError, LibraryResult};
use crate::signing_key::Environment;

/// 설정 파일 경로를 지정하는 환경변수.
pub const CONFIG_PATH_ENV: &str = "LIBRARY_CONFIG";

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 토큰 유효 시간 상한 (30일).
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// 애플리케이션 설정.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 시작 시 생성할 관리자 계정 (선택)
    pub seed_admin: Option<SeedAdminConfig>,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// CORS 허용 origin 목록 (비어 있으면 모든 origin 허용, 개발 모드)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 형식 주소.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL (없으면 `DATABASE_URL` 환경변수, 그것도 없으면 메모리 저장소)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 토큰 서명 키 (없으면 `JWT_SECRET` 환경변수)
    pub jwt_secret: Option<SecretString>,
    /// 토큰 유효 시간 (초)
    pub token_ttl_secs: u64,
    /// 배포 환경 (production이면 개발용 기본 키 거부)
    pub environment: Environment,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: 3600,
            environment: Environment::Development,
        }
    }
}

impl AuthConfig {
    /// 토큰 유효 시간.
    ///
    /// 0이거나 [`MAX_TOKEN_TTL_SECS`]를 넘으면 `LibraryError::Config`.
    pub fn token_ttl(&self) -> LibraryResult<chrono::Duration> {
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(LibraryError::Config(format!(
                "auth.token_ttl_secs must be between 1 and {} (got {})",
                MAX_TOKEN_TTL_SECS, self.token_ttl_secs
            )));
        }
        Ok(chrono::Duration::seconds(self.token_ttl_secs as i64))
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "library_api=info,library_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 시작 시 생성할 관리자 계정.
#[derive(Debug, Deserialize)]
pub struct SeedAdminConfig {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub email: String,
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 에러가 아닙니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드 (선택)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("LIBRARY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `LIBRARY_CONFIG` 경로 또는 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경변수 미적용).
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 값 범위 검증.
    fn validate(&self) -> Result<(), config::ConfigError> {
        self.auth
            .token_ttl()
            .map(|_| ())
            .map_err(|e| config::ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.environment, Environment::Development);
        assert!(config.auth.jwt_secret.is_none());
        assert!(config.seed_admin.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9090

            [auth]
            jwt_secret = "a-very-long-secret-value-for-testing-only"
            environment = "production"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.environment, Environment::Production);
        assert_eq!(
            config.auth.jwt_secret.as_ref().unwrap().expose_secret(),
            "a-very-long-secret-value-for-testing-only"
        );
    }

    #[test]
    fn test_seed_admin_section() {
        let config = AppConfig::from_toml_str(
            r#"
            [seed_admin]
            username = "root"
            password = "changeme123"
            "#,
        )
        .unwrap();

        let seed = config.seed_admin.unwrap();
        assert_eq!(seed.username, "root");
        assert_eq!(seed.password.expose_secret(), "changeme123");
        assert!(seed.email.is_empty());
    }

    #[test]
    fn test_token_ttl_range() {
        let config = AppConfig::default();
        assert_eq!(config.auth.token_ttl().unwrap(), chrono::Duration::hours(1));

        for bad in ["0", "9223372036854775807"] {
            let toml = format!("[auth]\ntoken_ttl_secs = {}\n", bad);
            let err = AppConfig::from_toml_str(&toml).unwrap_err();
            assert!(err.to_string().contains("token_ttl_secs"), "{}", err);
        }

        let auth = AuthConfig {
            token_ttl_secs: MAX_TOKEN_TTL_SECS + 1,
            ..AuthConfig::default()
        };
        assert!(matches!(auth.token_ttl(), Err(LibraryError::Config(_))));

        let auth = AuthConfig {
            token_ttl_secs: MAX_TOKEN_TTL_SECS,
            ..AuthConfig::default()
        };
        assert_eq!(auth.token_ttl().unwrap(), chrono::Duration::days(30));
    }

    #[test]
    fn test_secret_hidden_in_debug() {
        let config = AppConfig::from_toml_str(
            r#"
            [auth]
            jwt_secret = "a-very-long-secret-value-for-testing-only"
            "#,
        )
        .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("a-very-long-secret-value"));
    }
}
