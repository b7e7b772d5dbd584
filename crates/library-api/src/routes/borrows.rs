//! 대출 endpoint.
//!
//! - `/all`, `/admin/**` - ADMIN
//! - `POST /user/borrow`, `POST /user/return/{id}` - USER
//! - `/user/my-borrows` - USER 또는 ADMIN

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::info;

use library_core::Borrow;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;

/// 대출 요청 쿼리 (`?bookId=&days=`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowParams {
    pub book_id: i64,
    pub days: i64,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// GET /api/borrows/all
pub async fn list_borrows(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Borrow>>> {
    Ok(Json(state.store.list_borrows().await?))
}

/// GET /api/borrows/user/my-borrows
pub async fn my_borrows(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<Vec<Borrow>>> {
    Ok(Json(state.store.borrows_for_user(&principal.username).await?))
}

/// POST /api/borrows/user/borrow?bookId=&days=
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    ApiQuery(params): ApiQuery<BorrowParams>,
) -> ApiResult<Json<Borrow>> {
    let borrow = state
        .store
        .borrow_book(&principal.username, params.book_id, params.days, today())
        .await?;

    info!(
        borrow_id = borrow.id,
        book_id = borrow.book_id,
        username = %principal.username,
        due_date = %borrow.due_date,
        "Book borrowed"
    );
    Ok(Json(borrow))
}

/// POST /api/borrows/user/return/{borrow_id}
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    CurrentUser(principal): CurrentUser,
    ApiPath(borrow_id): ApiPath<i64>,
) -> ApiResult<Json<Borrow>> {
    let borrow = state
        .store
        .return_book(borrow_id, &principal.username, today())
        .await?;

    info!(borrow_id, penalty = %borrow.penalty, "Book returned");
    Ok(Json(borrow))
}

/// DELETE /api/borrows/admin/{borrow_id}
pub async fn delete_borrow(
    State(state): State<Arc<AppState>>,
    ApiPath(borrow_id): ApiPath<i64>,
) -> ApiResult<Json<Borrow>> {
    let borrow = state.store.delete_borrow(borrow_id).await?;
    info!(borrow_id, "Borrow record deleted");
    Ok(Json(borrow))
}

/// 대출 라우터 생성.
pub fn borrows_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/all", get(list_borrows))
        .route("/user/my-borrows", get(my_borrows))
        .route("/user/borrow", post(borrow_book))
        .route("/user/return/{borrow_id}", post(return_book))
        .route("/admin/{borrow_id}", delete(delete_borrow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn test_borrow_params_from_query() {
        let uri: Uri = "/api/borrows/user/borrow?bookId=12&days=7".parse().unwrap();
        let Query(params) = Query::<BorrowParams>::try_from_uri(&uri).unwrap();
        assert_eq!(params.book_id, 12);
        assert_eq!(params.days, 7);
    }

    #[test]
    fn test_borrow_params_require_both_fields() {
        let uri: Uri = "/api/borrows/user/borrow?book_id=12".parse().unwrap();
        assert!(Query::<BorrowParams>::try_from_uri(&uri).is_err());
    }
}
