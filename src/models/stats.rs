//! Library statistics

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TopBook {
    pub id: String,
    pub name: String,
    pub author: String,
    pub times_borrowed: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryStats {
    /// Number of catalog titles
    pub total_titles: i64,
    /// Sum of copies over all titles
    pub total_copies: i64,
    pub copies_on_loan: i64,
    pub total_readers: i64,
    pub total_librarians: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub returned_loans: i64,
    /// Five most borrowed titles
    pub top_books: Vec<TopBook>,
}
