//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반. 해시는 PHC 문자열(솔트 포함)로 저장합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// 비밀번호 처리 에러.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed")]
    HashingFailed,
    #[error("password mismatch")]
    Mismatch,
    #[error("stored hash is not a valid PHC string")]
    InvalidHashFormat,
}

/// 비밀번호 해싱.
///
/// ```rust,ignore
/// let hash = hash_password("s3cret-pass").unwrap();
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::HashingFailed)
}

/// 저장된 해시와 평문 비밀번호 비교.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("library-pass-1").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("library-pass-1", &hash).is_ok());
        assert_eq!(
            verify_password("library-pass-2", &hash),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_salted_hashes_differ() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same-password", &second).is_ok());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert_eq!(
            verify_password("anything", "$2a$10$not-argon"),
            Err(PasswordError::InvalidHashFormat)
        );
    }
}
