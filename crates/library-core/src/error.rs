//! 도서관 시스템의 에러 타입.
//!
//! 저장소와 서비스 계층 전반에서 사용되는 에러를 정의합니다.
//! 인증 관련 에러는 `library-api`의 `AuthError`가 별도로 담당합니다.

use thiserror::Error;

/// 핵심 도서관 에러.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// 찾을 수 없음
    #[error("{0}")]
    NotFound(String),

    /// 현재 상태와 충돌 (중복 회원, 대출 불가 도서, 이중 반납 등)
    #[error("{0}")]
    Conflict(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 다른 회원의 리소스에 대한 작업
    #[error("{0}")]
    Forbidden(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 도서관 작업을 위한 Result 타입.
pub type LibraryResult<T> = Result<T, LibraryError>;

impl LibraryError {
    /// 도서 없음.
    pub fn book_not_found(id: i64) -> Self {
        LibraryError::NotFound(format!("Book not found with id {}", id))
    }

    /// 회원 없음 (ID).
    pub fn user_not_found(id: i64) -> Self {
        LibraryError::NotFound(format!("User not found with id {}", id))
    }

    /// 대출 기록 없음.
    pub fn borrow_not_found(id: i64) -> Self {
        LibraryError::NotFound(format!("Borrow record not found with id {}", id))
    }

    /// 클라이언트 입력으로 인한 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LibraryError::NotFound(_)
                | LibraryError::Conflict(_)
                | LibraryError::InvalidInput(_)
                | LibraryError::Forbidden(_)
        )
    }
}

impl From<config::ConfigError> for LibraryError {
    fn from(err: config::ConfigError) -> Self {
        LibraryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(LibraryError::book_not_found(3).is_client_error());
        assert!(LibraryError::Conflict("dup".to_string()).is_client_error());
        assert!(!LibraryError::Database("down".to_string()).is_client_error());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            LibraryError::book_not_found(42).to_string(),
            "Book not found with id 42"
        );
    }
}
