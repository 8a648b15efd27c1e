//! Prefixed sequential IDs (BD001, TT002, S010, ...)

use sqlx::PgConnection;

use crate::error::AppResult;

pub const READER_PREFIX: &str = "BD";
pub const LIBRARIAN_PREFIX: &str = "TT";
pub const BOOK_PREFIX: &str = "S";
pub const CATEGORY_PREFIX: &str = "TL";

/// Format an ID with at least three digits
pub fn format_id(prefix: &str, number: i32) -> String {
    format!("{}{:03}", prefix, number)
}

/// Allocate the next free ID for `table`.
///
/// Must run inside the transaction that inserts the row: the table is locked
/// against concurrent writers until that transaction ends.
pub async fn next_id(
    conn: &mut PgConnection,
    table: &'static str,
    prefix: &'static str,
) -> AppResult<String> {
    sqlx::query(&format!("LOCK TABLE {} IN SHARE ROW EXCLUSIVE MODE", table))
        .execute(&mut *conn)
        .await?;

    let query = format!(
        "SELECT MAX(CAST(SUBSTRING(id FROM {}) AS INTEGER)) FROM {} WHERE id ~ $1",
        prefix.len() + 1,
        table
    );
    let max: Option<i32> = sqlx::query_scalar(&query)
        .bind(format!("^{}[0-9]+$", prefix))
        .fetch_one(&mut *conn)
        .await?;

    Ok(format_id(prefix, max.unwrap_or(0) + 1))
}
