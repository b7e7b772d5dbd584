//! PostgreSQL 저장소.
//!
//! 여러 테이블을 변경하는 작업(대출, 반납, 삭제)은 트랜잭션 안에서
//! 대상 행을 `FOR UPDATE`로 잠근 뒤 수행합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, PgExecutor};
use tracing::{debug, info};

use library_core::{
    due_date_for, Book, Borrow, DatabaseConfig, LibraryError, LibraryResult, NewBook, NewUser,
    Role, User, UserUpdate,
};

use super::{BookStore, BorrowStore, LibraryStore, UserStore};
use crate::auth::UserLookup;

// ================================================================================================
// Records
// ================================================================================================

#[derive(Debug, Clone, FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRecord> for User {
    type Error = LibraryError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let role = Role::parse(&record.role).ok_or_else(|| {
            LibraryError::Database(format!("unknown role '{}' for user {}", record.role, record.id))
        })?;

        Ok(User {
            id: record.id,
            username: record.username,
            email: record.email,
            role,
            password_hash: record.password_hash,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct BookRecord {
    id: i64,
    title: String,
    author: String,
    category: String,
    rent_per_day: Decimal,
    available: bool,
}

impl From<BookRecord> for Book {
    fn from(r: BookRecord) -> Self {
        Book {
            id: r.id,
            title: r.title,
            author: r.author,
            category: r.category,
            rent_per_day: r.rent_per_day,
            available: r.available,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct BorrowRecord {
    id: i64,
    user_id: i64,
    username: String,
    book_id: i64,
    book_title: String,
    borrow_date: NaiveDate,
    due_date: NaiveDate,
    return_date: Option<NaiveDate>,
    penalty: Decimal,
}

impl From<BorrowRecord> for Borrow {
    fn from(r: BorrowRecord) -> Self {
        Borrow {
            id: r.id,
            user_id: r.user_id,
            username: r.username,
            book_id: r.book_id,
            book_title: r.book_title,
            borrow_date: r.borrow_date,
            due_date: r.due_date,
            return_date: r.return_date,
            penalty: r.penalty,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role";

macro_rules! book_query {
    ($tail:literal) => {
        concat!(
            "SELECT id, title, author, category, rent_per_day, available FROM books ",
            $tail
        )
    };
}

macro_rules! borrow_query {
    ($tail:literal) => {
        concat!(
            "SELECT br.id, br.user_id, u.username, br.book_id, b.title AS book_title, ",
            "br.borrow_date, br.due_date, br.return_date, br.penalty ",
            "FROM borrows br ",
            "JOIN users u ON u.id = br.user_id ",
            "JOIN books b ON b.id = br.book_id ",
            $tail
        )
    };
}

fn db_error(err: sqlx::Error) -> LibraryError {
    LibraryError::Database(err.to_string())
}

fn duplicate_username_or(err: sqlx::Error, username: &str) -> LibraryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return LibraryError::Conflict(format!("Username already exists: {}", username));
        }
    }
    db_error(err)
}

/// `ILIKE` 부분 일치 패턴. 와일드카드 문자는 이스케이프합니다.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

async fn fetch_borrow<'e, E>(executor: E, id: i64) -> LibraryResult<Option<BorrowRecord>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, BorrowRecord>(borrow_query!("WHERE br.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error)
}

// ================================================================================================
// Store
// ================================================================================================

/// PostgreSQL 저장소.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// 연결 풀 생성.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> LibraryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await
            .map_err(db_error)?;

        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 내장 마이그레이션 실행.
    pub async fn migrate(&self) -> LibraryResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    async fn books_where(&self, sql: &'static str, arg: Option<String>) -> LibraryResult<Vec<Book>> {
        let mut query = sqlx::query_as::<_, BookRecord>(sql);
        if let Some(arg) = arg {
            query = query.bind(arg);
        }
        let records = query.fetch_all(&self.pool).await.map_err(db_error)?;
        Ok(records.into_iter().map(Book::from).collect())
    }
}

#[async_trait]
impl UserLookup for PgStore {
    async fn find_by_username(&self, username: &str) -> LibraryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(&self) -> LibraryResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        sqlx::query_as::<_, UserRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn find_user(&self, id: i64) -> LibraryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn create_user(&self, user: NewUser) -> LibraryResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_username_or(e, &user.username))?;

        debug!(user_id = record.id, "User created");
        record.try_into()
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> LibraryResult<User> {
        let sql = format!(
            "UPDATE users SET username = $2, email = $3, role = $4, \
             password_hash = COALESCE($5, password_hash) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .bind(&update.username)
            .bind(&update.email)
            .bind(update.role.as_str())
            .bind(&update.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| duplicate_username_or(e, &update.username))?
            .ok_or_else(|| LibraryError::user_not_found(id))?
            .try_into()
    }

    async fn delete_user(&self, id: i64) -> LibraryResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| LibraryError::user_not_found(id))?;

        sqlx::query(
            r#"
            UPDATE books SET available = TRUE
            WHERE id IN (SELECT book_id FROM borrows WHERE user_id = $1 AND return_date IS NULL)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query("DELETE FROM borrows WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)
    }
}

#[async_trait]
impl BookStore for PgStore {
    async fn list_books(&self) -> LibraryResult<Vec<Book>> {
        self.books_where(book_query!("ORDER BY id"), None).await
    }

    async fn find_book(&self, id: i64) -> LibraryResult<Option<Book>> {
        let record = sqlx::query_as::<_, BookRecord>(book_query!("WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(record.map(Book::from))
    }

    async fn available_books(&self) -> LibraryResult<Vec<Book>> {
        self.books_where(book_query!("WHERE available ORDER BY id"), None)
            .await
    }

    async fn search_by_title(&self, title: &str) -> LibraryResult<Vec<Book>> {
        self.books_where(
            book_query!("WHERE title ILIKE $1 ORDER BY id"),
            Some(contains_pattern(title)),
        )
        .await
    }

    async fn search_by_category(&self, category: &str) -> LibraryResult<Vec<Book>> {
        self.books_where(
            book_query!("WHERE category ILIKE $1 ORDER BY id"),
            Some(contains_pattern(category)),
        )
        .await
    }

    async fn create_book(&self, book: NewBook) -> LibraryResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            r#"
            INSERT INTO books (title, author, category, rent_per_day, available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author, category, rent_per_day, available
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.rent_per_day)
        .bind(book.available)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(record.into())
    }

    async fn update_book(&self, id: i64, book: NewBook) -> LibraryResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            r#"
            UPDATE books
            SET title = $2, author = $3, category = $4, rent_per_day = $5, available = $6
            WHERE id = $1
            RETURNING id, title, author, category, rent_per_day, available
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.rent_per_day)
        .bind(book.available)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| LibraryError::book_not_found(id))?;

        Ok(record.into())
    }

    async fn delete_book(&self, id: i64) -> LibraryResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| LibraryError::book_not_found(id))?;

        let open_borrows = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM borrows WHERE book_id = $1 AND return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        if open_borrows > 0 {
            return Err(LibraryError::Conflict(format!(
                "Book with id {} is currently borrowed",
                id
            )));
        }

        sqlx::query("DELETE FROM borrows WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)
    }
}

#[async_trait]
impl BorrowStore for PgStore {
    async fn list_borrows(&self) -> LibraryResult<Vec<Borrow>> {
        let records = sqlx::query_as::<_, BorrowRecord>(borrow_query!("ORDER BY br.id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(records.into_iter().map(Borrow::from).collect())
    }

    async fn borrows_for_user(&self, username: &str) -> LibraryResult<Vec<Borrow>> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| LibraryError::NotFound(format!("User not found: {}", username)))?;

        let records =
            sqlx::query_as::<_, BorrowRecord>(borrow_query!("WHERE br.user_id = $1 ORDER BY br.id"))
                .bind(user.id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(records.into_iter().map(Borrow::from).collect())
    }

    async fn borrow_book(
        &self,
        username: &str,
        book_id: i64,
        days: i64,
        today: NaiveDate,
    ) -> LibraryResult<Borrow> {
        let due_date = due_date_for(today, days)?;
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let user_id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| LibraryError::NotFound(format!("User not found: {}", username)))?;

        let available =
            sqlx::query_scalar::<_, bool>("SELECT available FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?
                .ok_or_else(|| LibraryError::book_not_found(book_id))?;
        if !available {
            return Err(LibraryError::Conflict(
                "Book is not available for borrowing".to_string(),
            ));
        }

        sqlx::query("UPDATE books SET available = FALSE WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let borrow_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO borrows (user_id, book_id, borrow_date, due_date, penalty)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(today)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let record = fetch_borrow(&mut *tx, borrow_id)
            .await?
            .ok_or_else(|| LibraryError::borrow_not_found(borrow_id))?;
        tx.commit().await.map_err(db_error)?;

        Ok(record.into())
    }

    async fn return_book(
        &self,
        borrow_id: i64,
        username: &str,
        today: NaiveDate,
    ) -> LibraryResult<Borrow> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let mut borrow: Borrow =
            sqlx::query_as::<_, BorrowRecord>(borrow_query!("WHERE br.id = $1 FOR UPDATE OF br"))
                .bind(borrow_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?
                .ok_or_else(|| LibraryError::borrow_not_found(borrow_id))?
                .into();
        if borrow.username != username {
            return Err(LibraryError::Forbidden(
                "Borrow record belongs to another user".to_string(),
            ));
        }

        let rent_per_day = sqlx::query_scalar::<_, Decimal>(
            "SELECT rent_per_day FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(borrow.book_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        borrow.settle(today, rent_per_day)?;

        sqlx::query("UPDATE borrows SET return_date = $2, penalty = $3 WHERE id = $1")
            .bind(borrow.id)
            .bind(borrow.return_date)
            .bind(borrow.penalty)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        sqlx::query("UPDATE books SET available = TRUE WHERE id = $1")
            .bind(borrow.book_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(borrow)
    }

    async fn delete_borrow(&self, borrow_id: i64) -> LibraryResult<Borrow> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let record = fetch_borrow(&mut *tx, borrow_id)
            .await?
            .ok_or_else(|| LibraryError::borrow_not_found(borrow_id))?;

        sqlx::query("DELETE FROM borrows WHERE id = $1")
            .bind(borrow_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        // 반납된 기록이면 도서가 이미 다른 대출에 묶여 있을 수 있음
        if record.return_date.is_none() {
            sqlx::query("UPDATE books SET available = TRUE WHERE id = $1")
                .bind(record.book_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(record.into())
    }
}

#[async_trait]
impl LibraryStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> LibraryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("dune"), "%dune%");
        assert_eq!(contains_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_user_record_with_unknown_role() {
        let record = UserRecord {
            id: 9,
            username: "ghost".to_string(),
            email: String::new(),
            password_hash: "x".to_string(),
            role: "SUPERUSER".to_string(),
        };
        assert!(matches!(User::try_from(record), Err(LibraryError::Database(_))));
    }

    #[test]
    fn test_user_record_conversion() {
        let user = User::try_from(UserRecord {
            id: 1,
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: "ADMIN".to_string(),
        })
        .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.password_hash, "$argon2id$...");
    }

    #[test]
    fn test_borrow_query_joins_titles() {
        let sql = borrow_query!("WHERE br.id = $1");
        assert!(sql.contains("b.title AS book_title"));
        assert!(sql.ends_with("WHERE br.id = $1"));
    }
}
