//! 도서관 운영을 위한 도메인 모델.

mod book;
mod borrow;
mod role;
mod user;

pub use book::*;
pub use borrow::*;
pub use role::*;
pub use user::*;
