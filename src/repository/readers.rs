//! Readers repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Credentials,
        reader::{Reader, ReaderInput, ReaderQuery},
    },
    repository::{
        ids::{self, READER_PREFIX},
        page_bounds,
    },
};

const READER_COLUMNS: &str = "id, name, phone, address, birth_date, gender";

#[derive(Clone)]
pub struct ReadersRepository {
    pool: Pool<Postgres>,
}

impl ReadersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List readers, optionally matching ID, name or phone
    pub async fn list(&self, query: &ReaderQuery) -> AppResult<(Vec<Reader>, i64, i64, i64)> {
        let (page, per_page, offset) = page_bounds(query.page, query.per_page);

        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));

        let where_clause = if search.is_some() {
            "WHERE id ILIKE $1 OR name ILIKE $1 OR phone ILIKE $1"
        } else {
            ""
        };
        let (limit_idx, offset_idx) = if search.is_some() { (2, 3) } else { (1, 2) };

        let count_q = format!("SELECT COUNT(*) FROM readers {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref s) = search {
            count_builder = count_builder.bind(s);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT {} FROM readers {} ORDER BY id LIMIT ${} OFFSET ${}",
            READER_COLUMNS, where_clause, limit_idx, offset_idx
        );
        let mut builder = sqlx::query_as::<_, Reader>(&select_q);
        if let Some(ref s) = search {
            builder = builder.bind(s);
        }
        let readers = builder.bind(per_page).bind(offset).fetch_all(&self.pool).await?;

        Ok((readers, total, page, per_page))
    }

    /// Get reader by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Reader> {
        sqlx::query_as::<_, Reader>(&format!("SELECT {} FROM readers WHERE id = $1", READER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", id)))
    }

    /// Create a reader with the next BD ID
    pub async fn create(&self, input: &ReaderInput) -> AppResult<Reader> {
        let mut tx = self.pool.begin().await?;

        let id = ids::next_id(&mut tx, "readers", READER_PREFIX).await?;

        let reader = sqlx::query_as::<_, Reader>(&format!(
            r#"
            INSERT INTO readers (id, name, phone, address, birth_date, gender)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            READER_COLUMNS
        ))
        .bind(&id)
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.address)
        .bind(input.date_of_birth)
        .bind(&input.gender)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reader)
    }

    /// Replace a reader's profile
    pub async fn update(&self, id: &str, input: &ReaderInput) -> AppResult<Reader> {
        sqlx::query_as::<_, Reader>(&format!(
            r#"
            UPDATE readers SET name = $2, phone = $3, address = $4, birth_date = $5, gender = $6
            WHERE id = $1
            RETURNING {}
            "#,
            READER_COLUMNS
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.address)
        .bind(input.date_of_birth)
        .bind(&input.gender)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", id)))
    }

    /// Delete a reader without unreturned books.
    /// Notifications and lending history go with the reader (ON DELETE CASCADE).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, String>("SELECT id FROM readers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", id)))?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lending_records WHERE reader_id = $1 AND return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            return Err(AppError::HasActiveBorrowings(
                "Cannot delete reader with active borrowings".to_string(),
            ));
        }

        sqlx::query("DELETE FROM readers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_credentials(&self, id: &str) -> AppResult<Option<Credentials>> {
        let credentials = sqlx::query_as::<_, Credentials>(
            "SELECT id, name, birth_date, password FROM readers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    pub async fn set_password(&self, id: &str, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE readers SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
