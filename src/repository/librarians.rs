//! Librarians repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Credentials,
        librarian::{Librarian, LibrarianInput},
    },
    repository::ids::{self, LIBRARIAN_PREFIX},
};

#[derive(Clone)]
pub struct LibrariansRepository {
    pool: Pool<Postgres>,
}

impl LibrariansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Librarian>> {
        let librarians = sqlx::query_as::<_, Librarian>(
            "SELECT id, name, birth_date, phone, address FROM librarians ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(librarians)
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Librarian> {
        sqlx::query_as::<_, Librarian>(
            "SELECT id, name, birth_date, phone, address FROM librarians WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Librarian with id {} not found", id)))
    }

    /// Create a librarian with the next TT ID
    pub async fn create(&self, input: &LibrarianInput) -> AppResult<Librarian> {
        let mut tx = self.pool.begin().await?;

        let id = ids::next_id(&mut tx, "librarians", LIBRARIAN_PREFIX).await?;

        let librarian = sqlx::query_as::<_, Librarian>(
            r#"
            INSERT INTO librarians (id, name, birth_date, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, birth_date, phone, address
            "#,
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(input.date_of_birth)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(librarian)
    }

    pub async fn get_credentials(&self, id: &str) -> AppResult<Option<Credentials>> {
        let credentials = sqlx::query_as::<_, Credentials>(
            "SELECT id, name, birth_date, password FROM librarians WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    pub async fn set_password(&self, id: &str, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE librarians SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
