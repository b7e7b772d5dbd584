//! 메모리 저장소.
//!
//! 모든 테이블을 하나의 `RwLock` 아래에 두어 대출/반납처럼 여러 테이블을
//! 건드리는 작업도 원자적으로 수행합니다. ID는 1부터 단조 증가합니다.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;

use library_core::{
    due_date_for, Book, Borrow, LibraryError, LibraryResult, NewBook, NewUser, User, UserUpdate,
};

use super::{BookStore, BorrowStore, LibraryStore, UserStore};
use crate::auth::UserLookup;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    books: BTreeMap<i64, Book>,
    borrows: BTreeMap<i64, Borrow>,
    last_user_id: i64,
    last_book_id: i64,
    last_borrow_id: i64,
}

impl Tables {
    fn user_by_name(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    fn filter_books(&self, pred: impl Fn(&Book) -> bool) -> Vec<Book> {
        self.books.values().filter(|b| pred(*b)).cloned().collect()
    }

    fn release_book(&mut self, book_id: i64) {
        if let Some(book) = self.books.get_mut(&book_id) {
            book.available = true;
        }
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// 메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserLookup for MemoryStore {
    async fn find_by_username(&self, username: &str) -> LibraryResult<Option<User>> {
        Ok(self.tables.read().await.user_by_name(username).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> LibraryResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_user(&self, id: i64) -> LibraryResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> LibraryResult<User> {
        let mut tables = self.tables.write().await;
        if tables.user_by_name(&user.username).is_some() {
            return Err(LibraryError::Conflict(format!(
                "Username already exists: {}",
                user.username
            )));
        }

        let id = next_id(&mut tables.last_user_id);
        let record = User {
            id,
            username: user.username,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
        };
        tables.users.insert(id, record.clone());
        debug!(user_id = id, "User created");
        Ok(record)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> LibraryResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != id && u.username == update.username)
        {
            return Err(LibraryError::Conflict(format!(
                "Username already exists: {}",
                update.username
            )));
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| LibraryError::user_not_found(id))?;
        user.apply(update);
        let updated = user.clone();

        // 대출 기록의 비정규화된 사용자 이름 갱신
        for borrow in tables.borrows.values_mut().filter(|b| b.user_id == id) {
            borrow.username = updated.username.clone();
        }
        Ok(updated)
    }

    async fn delete_user(&self, id: i64) -> LibraryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(LibraryError::user_not_found(id));
        }

        let owned: Vec<Borrow> = tables
            .borrows
            .values()
            .filter(|b| b.user_id == id)
            .cloned()
            .collect();
        for borrow in owned {
            tables.borrows.remove(&borrow.id);
            if !borrow.is_returned() {
                tables.release_book(borrow.book_id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list_books(&self) -> LibraryResult<Vec<Book>> {
        Ok(self.tables.read().await.books.values().cloned().collect())
    }

    async fn find_book(&self, id: i64) -> LibraryResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn available_books(&self) -> LibraryResult<Vec<Book>> {
        Ok(self.tables.read().await.filter_books(|b| b.available))
    }

    async fn search_by_title(&self, title: &str) -> LibraryResult<Vec<Book>> {
        Ok(self.tables.read().await.filter_books(|b| b.title_contains(title)))
    }

    async fn search_by_category(&self, category: &str) -> LibraryResult<Vec<Book>> {
        Ok(self
            .tables
            .read()
            .await
            .filter_books(|b| b.category_contains(category)))
    }

    async fn create_book(&self, book: NewBook) -> LibraryResult<Book> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.last_book_id);
        let record = Book::from_input(id, book);
        tables.books.insert(id, record.clone());
        Ok(record)
    }

    async fn update_book(&self, id: i64, book: NewBook) -> LibraryResult<Book> {
        let mut tables = self.tables.write().await;
        let record = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| LibraryError::book_not_found(id))?;
        record.apply(book);
        let updated = record.clone();

        for borrow in tables.borrows.values_mut().filter(|b| b.book_id == id) {
            borrow.book_title = updated.title.clone();
        }
        Ok(updated)
    }

    async fn delete_book(&self, id: i64) -> LibraryResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Err(LibraryError::book_not_found(id));
        }
        if tables
            .borrows
            .values()
            .any(|b| b.book_id == id && !b.is_returned())
        {
            return Err(LibraryError::Conflict(format!(
                "Book with id {} is currently borrowed",
                id
            )));
        }

        tables.books.remove(&id);
        tables.borrows.retain(|_, b| b.book_id != id);
        Ok(())
    }
}

#[async_trait]
impl BorrowStore for MemoryStore {
    async fn list_borrows(&self) -> LibraryResult<Vec<Borrow>> {
        Ok(self.tables.read().await.borrows.values().cloned().collect())
    }

    async fn borrows_for_user(&self, username: &str) -> LibraryResult<Vec<Borrow>> {
        let tables = self.tables.read().await;
        let user = tables
            .user_by_name(username)
            .ok_or_else(|| LibraryError::NotFound(format!("User not found: {}", username)))?;

        Ok(tables
            .borrows
            .values()
            .filter(|b| b.user_id == user.id)
            .cloned()
            .collect())
    }

    async fn borrow_book(
        &self,
        username: &str,
        book_id: i64,
        days: i64,
        today: NaiveDate,
    ) -> LibraryResult<Borrow> {
        let due_date = due_date_for(today, days)?;

        let mut tables = self.tables.write().await;
        let (user_id, username) = tables
            .user_by_name(username)
            .map(|u| (u.id, u.username.clone()))
            .ok_or_else(|| LibraryError::NotFound(format!("User not found: {}", username)))?;

        let book = tables
            .books
            .get_mut(&book_id)
            .ok_or_else(|| LibraryError::book_not_found(book_id))?;
        if !book.available {
            return Err(LibraryError::Conflict(
                "Book is not available for borrowing".to_string(),
            ));
        }
        book.available = false;
        let book_title = book.title.clone();

        let id = next_id(&mut tables.last_borrow_id);
        let borrow = Borrow {
            id,
            user_id,
            username,
            book_id,
            book_title,
            borrow_date: today,
            due_date,
            return_date: None,
            penalty: Decimal::ZERO,
        };
        tables.borrows.insert(id, borrow.clone());
        Ok(borrow)
    }

    async fn return_book(
        &self,
        borrow_id: i64,
        username: &str,
        today: NaiveDate,
    ) -> LibraryResult<Borrow> {
        let mut tables = self.tables.write().await;
        let Tables { books, borrows, .. } = &mut *tables;

        let borrow = borrows
            .get_mut(&borrow_id)
            .ok_or_else(|| LibraryError::borrow_not_found(borrow_id))?;
        if borrow.username != username {
            return Err(LibraryError::Forbidden(
                "Borrow record belongs to another user".to_string(),
            ));
        }

        let rent_per_day = books
            .get(&borrow.book_id)
            .map(|b| b.rent_per_day)
            .unwrap_or(Decimal::ZERO);
        borrow.settle(today, rent_per_day)?;

        if let Some(book) = books.get_mut(&borrow.book_id) {
            book.available = true;
        }
        Ok(borrow.clone())
    }

    async fn delete_borrow(&self, borrow_id: i64) -> LibraryResult<Borrow> {
        let mut tables = self.tables.write().await;
        let borrow = tables
            .borrows
            .remove(&borrow_id)
            .ok_or_else(|| LibraryError::borrow_not_found(borrow_id))?;
        if !borrow.is_returned() {
            tables.release_book(borrow.book_id);
        }
        Ok(borrow)
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> LibraryResult<()> {
        Ok(())
    }
}
