//! 저장소 계층.
//!
//! 라우트 핸들러는 [`LibraryStore`] 트레이트 객체만 사용합니다.
//! 백엔드는 두 가지입니다:
//!
//! - [`MemoryStore`]: 데이터베이스 미설정 시 및 테스트용
//! - [`PgStore`]: PostgreSQL (sqlx)
//!
//! 모든 변경 작업은 백엔드 단위로 원자적입니다. 메모리 저장소는 단일 락,
//! PostgreSQL은 트랜잭션으로 보장합니다.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use library_core::{Book, Borrow, LibraryResult, NewBook, NewUser, User, UserUpdate};

use crate::auth::UserLookup;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// 회원 저장소.
#[async_trait]
pub trait UserStore: UserLookup {
    async fn list_users(&self) -> LibraryResult<Vec<User>>;

    async fn find_user(&self, id: i64) -> LibraryResult<Option<User>>;

    /// 사용자 이름이 이미 있으면 `Conflict`.
    async fn create_user(&self, user: NewUser) -> LibraryResult<User>;

    /// `password_hash`가 `None`이면 기존 해시를 유지합니다.
    async fn update_user(&self, id: i64, update: UserUpdate) -> LibraryResult<User>;

    /// 회원의 대출 기록을 함께 삭제하고, 미반납 도서는 대출 가능 상태로 되돌립니다.
    async fn delete_user(&self, id: i64) -> LibraryResult<()>;
}

/// 도서 저장소.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list_books(&self) -> LibraryResult<Vec<Book>>;

    async fn find_book(&self, id: i64) -> LibraryResult<Option<Book>>;

    async fn available_books(&self) -> LibraryResult<Vec<Book>>;

    /// 제목 부분 일치 검색 (대소문자 무시).
    async fn search_by_title(&self, title: &str) -> LibraryResult<Vec<Book>>;

    /// 분류 부분 일치 검색 (대소문자 무시).
    async fn search_by_category(&self, category: &str) -> LibraryResult<Vec<Book>>;

    async fn create_book(&self, book: NewBook) -> LibraryResult<Book>;

    async fn update_book(&self, id: i64, book: NewBook) -> LibraryResult<Book>;

    /// 대출 중인 도서는 `Conflict`. 반납된 대출 기록은 함께 삭제됩니다.
    async fn delete_book(&self, id: i64) -> LibraryResult<()>;
}

/// 대출 저장소.
#[async_trait]
pub trait BorrowStore: Send + Sync {
    async fn list_borrows(&self) -> LibraryResult<Vec<Borrow>>;

    /// 회원의 대출 기록. 회원이 없으면 `NotFound`.
    async fn borrows_for_user(&self, username: &str) -> LibraryResult<Vec<Borrow>>;

    /// 도서 대출.
    ///
    /// 도서가 대출 불가 상태면 `Conflict`, `days < 1`이면 `InvalidInput`.
    async fn borrow_book(
        &self,
        username: &str,
        book_id: i64,
        days: i64,
        today: NaiveDate,
    ) -> LibraryResult<Borrow>;

    /// 도서 반납.
    ///
    /// 본인 대출이 아니면 `Forbidden`, 이미 반납됐으면 `Conflict`.
    async fn return_book(
        &self,
        borrow_id: i64,
        username: &str,
        today: NaiveDate,
    ) -> LibraryResult<Borrow>;

    /// 대출 기록 삭제. 도서는 대출 가능 상태로 돌아갑니다.
    async fn delete_borrow(&self, borrow_id: i64) -> LibraryResult<Borrow>;
}

/// 전체 저장소.
#[async_trait]
pub trait LibraryStore: UserStore + BookStore + BorrowStore {
    /// 백엔드 이름 ("memory" | "postgres").
    fn backend(&self) -> &'static str;

    /// 저장소 연결 확인.
    async fn ping(&self) -> LibraryResult<()>;
}
