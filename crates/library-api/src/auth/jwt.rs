//! JWT 토큰 처리.
//!
//! 토큰 발급, 클레임 추출 및 검증 로직.
//!
//! 서명(HS256)과 만료 시각이 유일한 무결성 보장입니다. 폐기 목록이나
//! Refresh Token 흐름은 없습니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use library_core::{Role, SigningKey};

/// 기본 토큰 유효 시간 (1시간).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 이름
    pub sub: String,
    /// 사용자 역할 ("USER" | "ADMIN")
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// 발급 시각과 유효 시간으로 Claims 생성.
    pub fn new(username: impl Into<String>, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: username.into(),
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// 토큰 디코딩/검증 실패.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// 만료된 토큰
    #[error("Token has expired")]
    Expired,
    /// 파싱 불가 또는 서명 불일치
    #[error("Invalid token")]
    Malformed,
    /// 예상치 못한 실패
    #[error("{0}")]
    Internal(String),
}

/// 토큰 코덱.
///
/// 프로세스 시작 시 해석된 [`SigningKey`] 하나로 서명과 검증을 모두 수행합니다.
/// 한 번 생성한 뒤 `Arc`로 공유합니다.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 서명 키와 토큰 유효 시간으로 코덱 생성.
    pub fn new(key: &SigningKey, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(key.expose_bytes()),
            decoding_key: DecodingKey::from_secret(key.expose_bytes()),
            validation,
            ttl,
        }
    }

    /// 기본 유효 시간(1시간)으로 코덱 생성.
    pub fn with_default_ttl(key: &SigningKey) -> Self {
        Self::new(key, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    /// 토큰 유효 시간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(&self, username: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(username, role, Utc::now())
    }

    /// 지정한 발급 시각으로 토큰 발급.
    ///
    /// 만료 시각은 `issued_at + ttl`입니다.
    pub fn issue_at(
        &self,
        username: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(username, role, issued_at, self.ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            TokenError::Internal(e.to_string())
        })
    }

    /// 토큰에서 사용자 이름 추출.
    ///
    /// # Errors
    ///
    /// - `Expired` - 만료된 토큰
    /// - `Malformed` - 파싱 불가, 서명 불일치, 빈 subject
    /// - `Internal` - 그 외 예상치 못한 실패
    pub fn decode_username(&self, token: &str) -> Result<String, TokenError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// 토큰에서 역할 클레임 추출.
    ///
    /// 실패 분류는 [`decode_username`](Self::decode_username)과 같습니다.
    pub fn decode_role(&self, token: &str) -> Result<Role, TokenError> {
        self.decode_claims(token).map(|claims| claims.role)
    }

    /// 서명과 만료를 검증합니다. 문제가 있으면 `false`.
    pub fn validate(&self, token: &str) -> bool {
        self.decode_claims(token).is_ok()
    }

    /// 토큰 디코딩 및 검증.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?;

        if data.claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(data.claims)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidSubject
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::Malformed,
        _ => {
            error!(error = %err, "Unexpected token decode failure");
            TokenError::Internal(err.to_string())
        }
    }
}
