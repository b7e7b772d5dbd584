//! 서버 시작 시 초기화.
//!
//! 저장소 선택과 관리자 계정 생성.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{info, warn};

use library_core::{DatabaseConfig, LibraryError, LibraryResult, NewUser, Role, SeedAdminConfig};

use crate::auth::hash_password;
use crate::repository::{LibraryStore, MemoryStore, PgStore};

/// 설정에 따라 저장소를 엽니다.
///
/// `database.url` → `DATABASE_URL` 순서로 URL을 찾고, 없으면 메모리 저장소를 씁니다.
/// PostgreSQL을 쓰는 경우 마이그레이션을 적용합니다.
pub async fn open_store(
    config: &DatabaseConfig,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> LibraryResult<Arc<dyn LibraryStore>> {
    let url = config
        .url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| env_lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()));

    match url {
        Some(url) => {
            let store = PgStore::connect(&url, config).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("No database configured, using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// 관리자 계정이 없으면 생성합니다.
///
/// 같은 이름의 회원이 이미 있으면 아무것도 바꾸지 않고 `false`를 반환합니다.
pub async fn seed_admin(store: &dyn LibraryStore, seed: &SeedAdminConfig) -> LibraryResult<bool> {
    if store.find_by_username(&seed.username).await?.is_some() {
        info!(username = %seed.username, "Seed admin already exists");
        return Ok(false);
    }

    let password = seed.password.expose_secret().to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| LibraryError::Internal(e.to_string()))?
        .map_err(|e| LibraryError::Internal(e.to_string()))?;

    let admin = store
        .create_user(NewUser {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;

    info!(user_id = admin.id, username = %admin.username, "Seed admin created");
    Ok(true)
}
