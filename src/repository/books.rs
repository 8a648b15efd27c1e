//! Books and categories repository

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput, BookQuery, BookRow, BookSort, Category},
    repository::{
        ids::{self, BOOK_PREFIX, CATEGORY_PREFIX},
        page_bounds,
    },
};

/// Copies of `b` currently out on loan
const BORROWED_COUNT: &str =
    "(SELECT COUNT(*) FROM lending_records lr WHERE lr.book_id = b.id AND lr.return_date IS NULL)";

fn book_select() -> String {
    format!(
        r#"
        SELECT b.id, b.name, c.name AS category, b.author, b.publisher, b.publish_year,
               b.quantity, b.import_date, b.origin, b.times_borrowed,
               {} AS borrowed_count
        FROM books b
        JOIN categories c ON c.id = b.category_id
        "#,
        BORROWED_COUNT
    )
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search books with filters, sorting and pagination
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64, i64, i64)> {
        let (page, per_page, offset) = page_bounds(query.page, query.per_page);

        let mut conditions = Vec::new();
        let mut idx = 1;

        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));
        if search.is_some() {
            conditions.push(format!(
                "(b.name ILIKE ${0} OR b.author ILIKE ${0} OR b.publisher ILIKE ${0})",
                idx
            ));
            idx += 1;
        }
        let category = query.category.as_deref().filter(|c| !c.is_empty());
        if category.is_some() {
            conditions.push(format!("LOWER(c.name) = LOWER(${})", idx));
            idx += 1;
        }
        if query.available_only.unwrap_or(false) {
            conditions.push(format!("b.quantity > {}", BORROWED_COUNT));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_q = format!(
            "SELECT COUNT(*) FROM books b JOIN categories c ON c.id = b.category_id {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref s) = search {
            count_builder = count_builder.bind(s);
        }
        if let Some(c) = category {
            count_builder = count_builder.bind(c);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let sort = query.sort.unwrap_or(BookSort::Id);
        let order = query.order.unwrap_or_default();
        let select_q = format!(
            "{} {} ORDER BY {} {}, b.id LIMIT ${} OFFSET ${}",
            book_select(),
            where_clause,
            sort.column(),
            order.as_sql(),
            idx,
            idx + 1
        );
        let mut builder = sqlx::query_as::<_, BookRow>(&select_q);
        if let Some(ref s) = search {
            builder = builder.bind(s);
        }
        if let Some(c) = category {
            builder = builder.bind(c);
        }
        let rows = builder.bind(per_page).bind(offset).fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Book::from).collect(), total, page, per_page))
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Book> {
        sqlx::query_as::<_, BookRow>(&format!("{} WHERE b.id = $1", book_select()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Book::from)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a book, creating its category when unknown
    pub async fn create(&self, input: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let category_id = resolve_category(&mut tx, &input.category).await?;
        let id = ids::next_id(&mut tx, "books", BOOK_PREFIX).await?;
        let import_date = input.import_date.unwrap_or_else(|| Utc::now().date_naive());

        sqlx::query(
            r#"
            INSERT INTO books (id, name, author, publisher, publish_year, category_id,
                               origin, quantity, import_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&id)
        .bind(input.name.trim())
        .bind(input.author.trim())
        .bind(input.publisher.trim())
        .bind(input.publish_year)
        .bind(&category_id)
        .bind(&input.origin)
        .bind(input.quantity)
        .bind(import_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_by_id(&id).await
    }

    /// Replace a book's catalog data
    pub async fn update(&self, id: &str, input: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        lock_book(&mut tx, id).await?;

        let borrowed = active_loans_for_book(&mut tx, id).await?;
        if (input.quantity as i64) < borrowed {
            return Err(AppError::BusinessRule(format!(
                "Quantity cannot be lower than the {} copies currently borrowed",
                borrowed
            )));
        }

        let category_id = resolve_category(&mut tx, &input.category).await?;

        sqlx::query(
            r#"
            UPDATE books SET
                name = $2, author = $3, publisher = $4, publish_year = $5,
                category_id = $6, origin = $7, quantity = $8,
                import_date = COALESCE($9, import_date), modif_date = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.author.trim())
        .bind(input.publisher.trim())
        .bind(input.publish_year)
        .bind(&category_id)
        .bind(&input.origin)
        .bind(input.quantity)
        .bind(input.import_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Delete a book that has no copy out on loan
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        lock_book(&mut tx, id).await?;

        if active_loans_for_book(&mut tx, id).await? > 0 {
            return Err(AppError::HasActiveBorrowings(
                "Cannot delete book with active borrowings".to_string(),
            ));
        }

        // Past lending records keep book_name; book_id is cleared by the foreign key
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List categories with their current number of titles
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.description, COUNT(b.id) AS book_count
            FROM categories c
            LEFT JOIN books b ON b.category_id = c.id
            GROUP BY c.id, c.name, c.description
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

/// Lock a book row for the rest of the transaction; returns its name and quantity
pub(crate) async fn lock_book(conn: &mut PgConnection, id: &str) -> AppResult<(String, i32)> {
    sqlx::query_as::<_, (String, i32)>("SELECT name, quantity FROM books WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
}

pub(crate) async fn active_loans_for_book(conn: &mut PgConnection, id: &str) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lending_records WHERE book_id = $1 AND return_date IS NULL",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Find a category by name (case-insensitive) or create it with the next TL ID
async fn resolve_category(conn: &mut PgConnection, name: &str) -> AppResult<String> {
    let name = name.trim();

    if let Some(id) = find_category(conn, name).await? {
        return Ok(id);
    }

    // next_id locks the table; look again in case a concurrent writer created it
    let id = ids::next_id(conn, "categories", CATEGORY_PREFIX).await?;
    if let Some(existing) = find_category(conn, name).await? {
        return Ok(existing);
    }

    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(&id)
        .bind(name)
        .execute(&mut *conn)
        .await?;

    tracing::info!("Created category {} ({})", name, id);
    Ok(id)
}

async fn find_category(conn: &mut PgConnection, name: &str) -> AppResult<Option<String>> {
    let id = sqlx::query_scalar::<_, String>("SELECT id FROM categories WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}
