//! 도서 타입.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 1일 대여료 상한. 저장소 컬럼 `NUMERIC(12, 2)`의 최댓값입니다.
pub const MAX_RENT_PER_DAY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// 도서 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    /// 1일 대여료 (연체료 계산 기준)
    pub rent_per_day: Decimal,
    /// 대출 가능 여부
    pub available: bool,
}

/// 도서 등록/수정 입력.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub rent_per_day: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Book {
    /// 입력으로부터 레코드 생성.
    pub fn from_input(id: i64, input: NewBook) -> Self {
        Self {
            id,
            title: input.title,
            author: input.author,
            category: input.category,
            rent_per_day: input.rent_per_day,
            available: input.available,
        }
    }

    /// 모든 필드를 입력값으로 덮어씁니다.
    pub fn apply(&mut self, input: NewBook) {
        self.title = input.title;
        self.author = input.author;
        self.category = input.category;
        self.rent_per_day = input.rent_per_day;
        self.available = input.available;
    }

    /// 제목 부분 일치 (대소문자 무시).
    pub fn title_contains(&self, needle: &str) -> bool {
        contains_ignore_case(&self.title, needle)
    }

    /// 분류 부분 일치 (대소문자 무시).
    pub fn category_contains(&self, needle: &str) -> bool {
        contains_ignore_case(&self.category, needle)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
