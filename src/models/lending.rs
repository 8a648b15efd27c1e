//! Lending record (borrow transaction) model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Lending record row from database
#[derive(Debug, Clone, FromRow)]
pub struct LendingRecordRow {
    pub id: i32,
    pub book_id: Option<String>,
    pub book_name: String,
    pub reader_id: String,
    pub reader_name: String,
    pub librarian_id: Option<String>,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

/// Lending status, derived from the record dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LendingStatus {
    Active,
    Overdue,
    Returned,
}

impl LendingStatus {
    pub fn from_dates(
        due_date: DateTime<Utc>,
        return_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        match return_date {
            Some(_) => LendingStatus::Returned,
            None if due_date < now => LendingStatus::Overdue,
            None => LendingStatus::Active,
        }
    }
}

/// Lending record with reader name and status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LendingRecord {
    pub id: i32,
    /// None once the book has been removed from the catalog
    pub book_id: Option<String>,
    pub book_name: String,
    pub reader_id: String,
    pub reader_name: String,
    pub librarian_id: Option<String>,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LendingStatus,
    pub is_overdue: bool,
}

impl LendingRecord {
    pub fn from_row(row: LendingRecordRow, now: DateTime<Utc>) -> Self {
        let status = LendingStatus::from_dates(row.due_date, row.return_date, now);
        LendingRecord {
            id: row.id,
            book_id: row.book_id,
            book_name: row.book_name,
            reader_id: row.reader_id,
            reader_name: row.reader_name,
            librarian_id: row.librarian_id,
            borrow_date: row.borrow_date,
            due_date: row.due_date,
            return_date: row.return_date,
            status,
            is_overdue: status == LendingStatus::Overdue,
        }
    }
}

impl From<LendingRecordRow> for LendingRecord {
    fn from(row: LendingRecordRow) -> Self {
        LendingRecord::from_row(row, Utc::now())
    }
}

/// Due date for a loan starting at `borrow_date`
pub fn due_date(borrow_date: DateTime<Utc>, period_days: i64) -> DateTime<Utc> {
    borrow_date + Duration::days(period_days)
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub book_id: String,
    pub reader_id: String,
}

/// Everything the repository needs to record a loan
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub book_id: String,
    pub reader_id: String,
    pub librarian_id: Option<String>,
    pub borrow_date: DateTime<Utc>,
    pub period_days: i64,
    pub max_active_loans: i64,
}

/// Action on an existing record (only "return" is supported)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordAction {
    pub action: String,
}

/// Lending record query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LendingQuery {
    /// Restrict to one reader (ignored for readers, who always see their own)
    pub reader_id: Option<String>,
    pub status: Option<LendingStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    fn row(due: DateTime<Utc>, returned: Option<DateTime<Utc>>) -> LendingRecordRow {
        LendingRecordRow {
            id: 1,
            book_id: Some("S001".to_string()),
            book_name: "Dune".to_string(),
            reader_id: "BD001".to_string(),
            reader_name: "Reader".to_string(),
            librarian_id: Some("TT001".to_string()),
            borrow_date: at(1),
            due_date: due,
            return_date: returned,
        }
    }

    #[test]
    fn test_due_date() {
        assert_eq!(due_date(at(1), 14), at(15));
    }

    #[test]
    fn test_status_from_dates() {
        assert_eq!(LendingStatus::from_dates(at(15), None, at(10)), LendingStatus::Active);
        assert_eq!(LendingStatus::from_dates(at(15), None, at(16)), LendingStatus::Overdue);
        assert_eq!(
            LendingStatus::from_dates(at(15), Some(at(20)), at(25)),
            LendingStatus::Returned
        );
    }

    #[test]
    fn test_due_now_is_not_overdue() {
        assert_eq!(LendingStatus::from_dates(at(15), None, at(15)), LendingStatus::Active);
    }

    #[test]
    fn test_record_overdue_flag() {
        let record = LendingRecord::from_row(row(at(15), None), at(16));
        assert!(record.is_overdue);
        assert_eq!(record.status, LendingStatus::Overdue);

        let record = LendingRecord::from_row(row(at(15), Some(at(20))), at(25));
        assert!(!record.is_overdue);
        assert_eq!(record.status, LendingStatus::Returned);
    }
}
