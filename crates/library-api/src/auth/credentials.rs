//! 로그인 자격 증명 검증.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use library_core::{LibraryResult, User};

use super::error::AuthError;
use super::password::{verify_password, PasswordError};

/// 사용자 이름으로 회원을 조회하는 기능.
///
/// 저장소 계층이 구현합니다.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_username(&self, username: &str) -> LibraryResult<Option<User>>;
}

/// 사용자 이름/비밀번호 쌍을 검증하고 회원 정보를 반환합니다.
///
/// # Errors
///
/// - `NotFound` - 등록되지 않은 사용자 이름
/// - `InvalidCredentials` - 비밀번호 불일치
/// - `Internal` - 저장소 장애, 손상된 해시
pub async fn verify_credentials<L>(
    lookup: &L,
    username: &str,
    password: &str,
) -> Result<User, AuthError>
where
    L: UserLookup + ?Sized,
{
    let user = lookup
        .find_by_username(username)
        .await
        .map_err(|e| {
            error!(error = %e, "User lookup failed during login");
            AuthError::Internal(e.to_string())
        })?
        .ok_or_else(|| {
            debug!(username = %username, "Login for unknown user");
            AuthError::NotFound
        })?;

    // Argon2 검증은 CPU 집약적이므로 블로킹 스레드에서 실행
    let plaintext = password.to_owned();
    let hash = user.password_hash.clone();
    let outcome = tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    match outcome {
        Ok(()) => Ok(user),
        Err(PasswordError::Mismatch) => {
            warn!(username = %username, "Password mismatch");
            Err(AuthError::InvalidCredentials)
        }
        Err(e) => {
            error!(username = %username, error = %e, "Stored password hash is unusable");
            Err(AuthError::Internal(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use library_core::{LibraryError, Role};

    struct FixedLookup(Vec<User>);

    #[async_trait]
    impl UserLookup for FixedLookup {
        async fn find_by_username(&self, username: &str) -> LibraryResult<Option<User>> {
            Ok(self.0.iter().find(|u| u.username == username).cloned())
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl UserLookup for BrokenLookup {
        async fn find_by_username(&self, _username: &str) -> LibraryResult<Option<User>> {
            Err(LibraryError::Database("connection refused".to_string()))
        }
    }

    fn user(username: &str, password_hash: String) -> User {
        User {
            id: 1,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role: Role::Admin,
            password_hash,
        }
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let lookup = FixedLookup(vec![user("alice", hash_password("wonderland").unwrap())]);

        let found = verify_credentials(&lookup, "alice", "wonderland").await.unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let lookup = FixedLookup(vec![user("alice", hash_password("wonderland").unwrap())]);

        let result = verify_credentials(&lookup, "alice", "looking-glass").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let lookup = FixedLookup(Vec::new());

        let result = verify_credentials(&lookup, "nobody", "whatever").await;
        assert_eq!(result.unwrap_err(), AuthError::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_internal() {
        let result = verify_credentials(&BrokenLookup, "alice", "wonderland").await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_internal() {
        let lookup = FixedLookup(vec![user("alice", "plaintext-oops".to_string())]);

        let result = verify_credentials(&lookup, "alice", "plaintext-oops").await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }
}
