//! Lending records repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        lending::{due_date, LendingRecord, LendingRecordRow, LendingStatus, NewLoan},
        notification::{new_borrow_message, NewNotification, NotificationType},
    },
    repository::{books, notifications},
};

const RECORD_SELECT: &str = r#"
    SELECT lr.id, lr.book_id, lr.book_name, lr.reader_id, r.name AS reader_name,
           lr.librarian_id, lr.borrow_date, lr.due_date, lr.return_date
    FROM lending_records lr
    JOIN readers r ON r.id = lr.reader_id
"#;

/// SQL condition selecting records in `status`
fn status_condition(status: LendingStatus) -> &'static str {
    match status {
        LendingStatus::Returned => "lr.return_date IS NOT NULL",
        LendingStatus::Overdue => "lr.return_date IS NULL AND lr.due_date < NOW()",
        LendingStatus::Active => "lr.return_date IS NULL AND lr.due_date >= NOW()",
    }
}

pub fn borrow_limit_message(max_active_loans: i64) -> String {
    format!(
        "Reader has already borrowed the maximum of {} books. Return a book before borrowing more.",
        max_active_loans
    )
}

#[derive(Clone)]
pub struct LendingRepository {
    pool: Pool<Postgres>,
}

impl LendingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List records, newest borrow first
    pub async fn list(
        &self,
        reader_id: Option<&str>,
        status: Option<LendingStatus>,
    ) -> AppResult<Vec<LendingRecord>> {
        let mut conditions = Vec::new();
        if reader_id.is_some() {
            conditions.push("lr.reader_id = $1");
        }
        if let Some(status) = status {
            conditions.push(status_condition(status));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let q = format!(
            "{} {} ORDER BY lr.borrow_date DESC, lr.id DESC",
            RECORD_SELECT, where_clause
        );
        let mut builder = sqlx::query_as::<_, LendingRecordRow>(&q);
        if let Some(reader_id) = reader_id {
            builder = builder.bind(reader_id);
        }
        let rows = builder.fetch_all(&self.pool).await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| LendingRecord::from_row(row, now)).collect())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<LendingRecord> {
        sqlx::query_as::<_, LendingRecordRow>(&format!("{} WHERE lr.id = $1", RECORD_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LendingRecord::from)
            .ok_or_else(|| AppError::NotFound(format!("Lending record with id {} not found", id)))
    }

    /// Unreturned records past their due date
    pub async fn overdue(&self) -> AppResult<Vec<LendingRecord>> {
        self.list(None, Some(LendingStatus::Overdue)).await
    }

    /// Record a loan: availability and borrow limit checks, insert,
    /// lifetime counter and borrow notification in one transaction
    pub async fn borrow(&self, loan: &NewLoan) -> AppResult<LendingRecord> {
        let mut tx = self.pool.begin().await?;

        // Locking the reader row serializes concurrent borrows by the same reader
        let reader_name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM readers WHERE id = $1 FOR UPDATE",
        )
        .bind(&loan.reader_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", loan.reader_id)))?;

        let (book_name, quantity) = books::lock_book(&mut tx, &loan.book_id).await?;

        let borrowed = books::active_loans_for_book(&mut tx, &loan.book_id).await?;
        if quantity as i64 - borrowed <= 0 {
            return Err(AppError::NotAvailable(format!(
                "No copies of \"{}\" are currently available",
                book_name
            )));
        }

        let reader_active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lending_records WHERE reader_id = $1 AND return_date IS NULL",
        )
        .bind(&loan.reader_id)
        .fetch_one(&mut *tx)
        .await?;
        if reader_active >= loan.max_active_loans {
            return Err(AppError::BorrowLimitReached(borrow_limit_message(loan.max_active_loans)));
        }

        let due = due_date(loan.borrow_date, loan.period_days);

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO lending_records (reader_id, librarian_id, book_id, book_name, borrow_date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&loan.reader_id)
        .bind(&loan.librarian_id)
        .bind(&loan.book_id)
        .bind(&book_name)
        .bind(loan.borrow_date)
        .bind(due)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET times_borrowed = times_borrowed + 1 WHERE id = $1")
            .bind(&loan.book_id)
            .execute(&mut *tx)
            .await?;

        notifications::insert(
            &mut tx,
            &NewNotification {
                reader_id: loan.reader_id.clone(),
                lending_record_id: Some(id),
                message: new_borrow_message(&book_name, due),
                notification_type: NotificationType::NewBorrow,
            },
        )
        .await?;

        tx.commit().await?;

        let row = LendingRecordRow {
            id,
            book_id: Some(loan.book_id.clone()),
            book_name,
            reader_id: loan.reader_id.clone(),
            reader_name,
            librarian_id: loan.librarian_id.clone(),
            borrow_date: loan.borrow_date,
            due_date: due,
            return_date: None,
        };
        Ok(LendingRecord::from_row(row, loan.borrow_date))
    }

    /// Mark a record as returned
    pub async fn return_book(&self, id: i32) -> AppResult<LendingRecord> {
        let mut tx = self.pool.begin().await?;

        let mut row = sqlx::query_as::<_, LendingRecordRow>(&format!(
            "{} WHERE lr.id = $1 FOR UPDATE OF lr",
            RECORD_SELECT
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lending record with id {} not found", id)))?;

        if row.return_date.is_some() {
            return Err(AppError::AlreadyReturned("Book has already been returned".to_string()));
        }

        let now = Utc::now();
        sqlx::query("UPDATE lending_records SET return_date = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.return_date = Some(now);
        Ok(LendingRecord::from_row(row, now))
    }
}
