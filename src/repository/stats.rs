//! Statistics queries

use sqlx::{Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::stats::{LibraryStats, TopBook},
};

#[derive(Clone)]
pub struct StatsRepository {
    pool: Pool<Postgres>,
}

impl StatsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> AppResult<LibraryStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS total_titles,
                (SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM books) AS total_copies,
                (SELECT COUNT(*) FROM readers) AS total_readers,
                (SELECT COUNT(*) FROM librarians) AS total_librarians,
                (SELECT COUNT(*) FROM lending_records
                    WHERE return_date IS NULL AND book_id IS NOT NULL) AS copies_on_loan,
                (SELECT COUNT(*) FROM lending_records
                    WHERE return_date IS NULL AND due_date >= NOW()) AS active_loans,
                (SELECT COUNT(*) FROM lending_records
                    WHERE return_date IS NULL AND due_date < NOW()) AS overdue_loans,
                (SELECT COUNT(*) FROM lending_records WHERE return_date IS NOT NULL) AS returned_loans
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let top_books = sqlx::query_as::<_, TopBook>(
            r#"
            SELECT id, name, author, times_borrowed
            FROM books
            WHERE times_borrowed > 0
            ORDER BY times_borrowed DESC, id
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(LibraryStats {
            total_titles: row.get("total_titles"),
            total_copies: row.get("total_copies"),
            copies_on_loan: row.get("copies_on_loan"),
            total_readers: row.get("total_readers"),
            total_librarians: row.get("total_librarians"),
            active_loans: row.get("active_loans"),
            overdue_loans: row.get("overdue_loans"),
            returned_loans: row.get("returned_loans"),
            top_books,
        })
    }
}
