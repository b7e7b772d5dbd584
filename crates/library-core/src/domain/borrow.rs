//! 대출 기록 및 연체료 계산.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, LibraryResult};

/// 대출 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub book_id: i64,
    pub book_title: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    /// 반납일 (미반납 시 None)
    pub return_date: Option<NaiveDate>,
    /// 연체료
    pub penalty: Decimal,
}

/// 대출 기간으로 반납 예정일 계산.
///
/// 대출 기간은 최소 1일입니다.
pub fn due_date_for(borrow_date: NaiveDate, days: i64) -> LibraryResult<NaiveDate> {
    if days < 1 {
        return Err(LibraryError::InvalidInput(format!(
            "borrow period must be at least one day (got {})",
            days
        )));
    }

    borrow_date
        .checked_add_days(Days::new(days as u64))
        .ok_or_else(|| LibraryError::InvalidInput(format!("borrow period too long: {} days", days)))
}

impl Borrow {
    /// 반납 여부.
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }

    /// 반납 처리.
    ///
    /// 반납일이 예정일을 넘기면 `연체일수 × 1일 대여료`를 연체료로 기록합니다.
    /// 이미 반납된 기록이면 `Conflict`, 연체료가 `Decimal` 범위를 넘으면
    /// `Internal`을 반환하며 두 경우 모두 기록은 바뀌지 않습니다.
    pub fn settle(&mut self, return_date: NaiveDate, rent_per_day: Decimal) -> LibraryResult<()> {
        if self.is_returned() {
            return Err(LibraryError::Conflict(
                "Book has already been returned".to_string(),
            ));
        }

        let penalty = if return_date > self.due_date {
            let overdue_days = (return_date - self.due_date).num_days();
            Decimal::from(overdue_days)
                .checked_mul(rent_per_day)
                .ok_or_else(|| {
                    LibraryError::Internal(format!(
                        "penalty overflow: {} overdue days at {} per day",
                        overdue_days, rent_per_day
                    ))
                })?
        } else {
            Decimal::ZERO
        };

        self.return_date = Some(return_date);
        self.penalty = penalty;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_RENT_PER_DAY;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_borrow() -> Borrow {
        Borrow {
            id: 1,
            user_id: 2,
            username: "alice".to_string(),
            book_id: 3,
            book_title: "Dune".to_string(),
            borrow_date: date(2024, 3, 1),
            due_date: date(2024, 3, 8),
            return_date: None,
            penalty: Decimal::ZERO,
        }
    }

    #[test]
    fn test_due_date() {
        assert_eq!(due_date_for(date(2024, 2, 27), 3).unwrap(), date(2024, 3, 1));
        assert!(matches!(
            due_date_for(date(2024, 2, 27), 0),
            Err(LibraryError::InvalidInput(_))
        ));
        assert!(due_date_for(date(2024, 2, 27), -5).is_err());
    }

    #[test]
    fn test_on_time_return_has_no_penalty() {
        let mut borrow = open_borrow();
        borrow.settle(date(2024, 3, 8), dec!(1.50)).unwrap();

        assert_eq!(borrow.return_date, Some(date(2024, 3, 8)));
        assert_eq!(borrow.penalty, Decimal::ZERO);
    }

    #[test]
    fn test_late_return_penalty() {
        let mut borrow = open_borrow();
        borrow.settle(date(2024, 3, 12), dec!(1.50)).unwrap();

        // 4일 연체
        assert_eq!(borrow.penalty, dec!(6.00));
    }

    #[test]
    fn test_penalty_overflow_is_an_error() {
        let mut borrow = open_borrow();
        let err = borrow.settle(date(2024, 3, 16), Decimal::MAX).unwrap_err();

        assert!(matches!(err, LibraryError::Internal(_)));
        assert!(!borrow.is_returned());
        assert_eq!(borrow.penalty, Decimal::ZERO);
    }

    #[test]
    fn test_penalty_at_max_rent() {
        let mut borrow = open_borrow();
        borrow.settle(date(2024, 3, 10), MAX_RENT_PER_DAY).unwrap();

        assert_eq!(borrow.penalty, dec!(19999999999.98));
    }

    #[test]
    fn test_double_return_rejected() {
        let mut borrow = open_borrow();
        borrow.settle(date(2024, 3, 5), dec!(1)).unwrap();

        let err = borrow.settle(date(2024, 3, 20), dec!(1)).unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));
        // 첫 반납 정보는 그대로
        assert_eq!(borrow.return_date, Some(date(2024, 3, 5)));
        assert_eq!(borrow.penalty, Decimal::ZERO);
    }
}
