//! 도서 카탈로그 endpoint.
//!
//! 조회/검색(GET)은 공개, `/admin` 하위 변경 작업은 ADMIN 전용입니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};

use library_core::{Book, LibraryError, NewBook, MAX_RENT_PER_DAY};

use super::MessageResponse;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

/// 도서 등록/수정 요청.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "author must be 1-255 characters"))]
    pub author: String,
    #[validate(length(min = 1, max = 100, message = "category must be 1-100 characters"))]
    pub category: String,
    #[validate(custom(function = "validate_rent"))]
    pub rent_per_day: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

fn validate_rent(rent: &Decimal) -> Result<(), ValidationError> {
    if rent.is_sign_negative() {
        let mut err = ValidationError::new("negative_rent");
        err.message = Some("rentPerDay must not be negative".into());
        return Err(err);
    }
    if *rent > MAX_RENT_PER_DAY {
        let mut err = ValidationError::new("rent_too_large");
        err.message = Some(format!("rentPerDay must not exceed {}", MAX_RENT_PER_DAY).into());
        return Err(err);
    }
    Ok(())
}

impl BookRequest {
    fn into_input(self) -> ApiResult<NewBook> {
        self.validate().map_err(ApiError::validation)?;
        Ok(NewBook {
            title: self.title,
            author: self.author,
            category: self.category,
            rent_per_day: self.rent_per_day,
            available: self.available,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// 공백이 아닌 검색어만 통과.
fn search_term(raw: Option<String>) -> Option<String> {
    raw.filter(|term| !term.trim().is_empty())
}

/// GET /api/books
pub async fn list_books(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(state.store.list_books().await?))
}

/// GET /api/books/{id}
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Book>> {
    state
        .store
        .find_book(id)
        .await?
        .map(Json)
        .ok_or_else(|| LibraryError::NotFound(format!("Book not found with id: {}", id)).into())
}

/// GET /api/books/available
pub async fn available_books(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(state.store.available_books().await?))
}

/// GET /api/books/search/title?title=
///
/// 검색어가 비어 있으면 400과 빈 목록.
pub async fn search_by_title(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TitleQuery>,
) -> ApiResult<(StatusCode, Json<Vec<Book>>)> {
    let Some(term) = search_term(query.title) else {
        return Ok((StatusCode::BAD_REQUEST, Json(Vec::new())));
    };
    Ok((StatusCode::OK, Json(state.store.search_by_title(&term).await?)))
}

/// GET /api/books/search/category?category=
pub async fn search_by_category(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> ApiResult<(StatusCode, Json<Vec<Book>>)> {
    let Some(term) = search_term(query.category) else {
        return Ok((StatusCode::BAD_REQUEST, Json(Vec::new())));
    };
    Ok((StatusCode::OK, Json(state.store.search_by_category(&term).await?)))
}

/// POST /api/books/admin
pub async fn add_book(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<BookRequest>,
) -> ApiResult<Json<Book>> {
    let book = state.store.create_book(request.into_input()?).await?;
    info!(book_id = book.id, title = %book.title, "Book added");
    Ok(Json(book))
}

/// PUT /api/books/admin/{id}
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<BookRequest>,
) -> ApiResult<Json<Book>> {
    let book = state.store.update_book(id, request.into_input()?).await?;
    info!(book_id = id, "Book updated");
    Ok(Json(book))
}

/// DELETE /api/books/admin/{id}
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.delete_book(id).await?;
    info!(book_id = id, "Book deleted");
    Ok(Json(MessageResponse::new(format!(
        "Book with id {} deleted successfully",
        id
    ))))
}

/// 도서 라우터 생성.
pub fn books_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_books))
        .route("/available", get(available_books))
        .route("/search/title", get(search_by_title))
        .route("/search/category", get(search_by_category))
        .route("/{id}", get(get_book))
        .route("/admin", post(add_book))
        .route("/admin/{id}", put(update_book).delete(delete_book))
}
