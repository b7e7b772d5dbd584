//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 래핑되어 라우터와 미들웨어에 주입됩니다.
//! 토큰 코덱과 인가 정책은 읽기 전용이며, 저장소는 자체적으로 일관성을 보장합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::{AuthorizationPolicy, TokenCodec};
use crate::repository::LibraryStore;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 토큰 발급/검증 (프로세스 전역 서명 키 사용)
    pub codec: Arc<TokenCodec>,

    /// 경로별 역할 정책
    pub policy: Arc<AuthorizationPolicy>,

    /// 회원/도서/대출 저장소
    pub store: Arc<dyn LibraryStore>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 기본 정책(도서관 API)으로 상태 생성.
    pub fn new(codec: TokenCodec, store: Arc<dyn LibraryStore>) -> Self {
        Self {
            codec: Arc::new(codec),
            policy: Arc::new(AuthorizationPolicy::library()),
            store,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 인가 정책 교체.
    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 상태 생성 (메모리 저장소, 고정 서명 키).
#[cfg(test)]
pub fn create_test_state() -> AppState {
    use crate::repository::MemoryStore;
    use library_core::SigningKey;

    let key = SigningKey::from_secret("test-secret-key-for-library-api-tests-32+")
        .expect("test secret is long enough");
    AppState::new(
        TokenCodec::with_default_ttl(&key),
        Arc::new(MemoryStore::new()),
    )
}
