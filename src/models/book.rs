//! Book (catalog) model and related types

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::validate_non_blank;

/// Internal row structure for book queries
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub author: String,
    pub publisher: String,
    pub publish_year: i32,
    pub quantity: i32,
    pub import_date: NaiveDate,
    pub origin: Option<String>,
    pub times_borrowed: i32,
    pub borrowed_count: i64,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            available: available_copies(row.quantity, row.borrowed_count),
            id: row.id,
            name: row.name,
            category: row.category,
            author: row.author,
            publisher: row.publisher,
            publish_year: row.publish_year,
            quantity: row.quantity,
            import_date: row.import_date,
            origin: row.origin,
            borrowed_count: row.borrowed_count,
            times_borrowed: row.times_borrowed,
        }
    }
}

/// Book with its current lending counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Book {
    /// Book ID (S001, S002, ...)
    pub id: String,
    /// Title
    pub name: String,
    /// Category name
    pub category: String,
    pub author: String,
    pub publisher: String,
    pub publish_year: i32,
    /// Total copies owned
    pub quantity: i32,
    pub import_date: NaiveDate,
    /// Supplier or donor
    pub origin: Option<String>,
    /// Copies currently out on loan
    pub borrowed_count: i64,
    /// Copies on the shelf
    pub available: i64,
    /// Lifetime number of loans
    pub times_borrowed: i32,
}

/// Copies left on the shelf, never negative
pub fn available_copies(quantity: i32, borrowed: i64) -> i64 {
    (quantity as i64 - borrowed).max(0)
}

fn validate_publish_year(year: i32) -> Result<(), ValidationError> {
    let max_year = Utc::now().year() + 5;
    if year < 1000 {
        let mut err = ValidationError::new("publish_year");
        err.message = Some("Enter a valid 4-digit year".into());
        return Err(err);
    }
    if year > max_year {
        let mut err = ValidationError::new("publish_year");
        err.message = Some("Year cannot be too far in the future".into());
        return Err(err);
    }
    Ok(())
}

/// Create or replace book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(custom(function = "validate_non_blank", message = "Name is required"))]
    pub name: String,
    /// Category name; created when unknown
    #[validate(custom(function = "validate_non_blank", message = "Category is required"))]
    pub category: String,
    #[validate(custom(function = "validate_non_blank", message = "Author is required"))]
    pub author: String,
    #[validate(custom(function = "validate_non_blank", message = "Publisher is required"))]
    pub publisher: String,
    #[validate(custom(function = "validate_publish_year"))]
    pub publish_year: i32,
    #[validate(range(min = 0, message = "Total quantity must be a non-negative integer"))]
    pub quantity: i32,
    /// Defaults to today
    pub import_date: Option<NaiveDate>,
    pub origin: Option<String>,
}

/// Sortable book columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookSort {
    Id,
    Name,
    Category,
    Author,
    Publisher,
    PublishYear,
    Quantity,
    ImportDate,
    BorrowedCount,
}

impl BookSort {
    /// Column expression in the book select
    pub fn column(&self) -> &'static str {
        match self {
            BookSort::Id => "b.id",
            BookSort::Name => "LOWER(b.name)",
            BookSort::Category => "LOWER(c.name)",
            BookSort::Author => "LOWER(b.author)",
            BookSort::Publisher => "LOWER(b.publisher)",
            BookSort::PublishYear => "b.publish_year",
            BookSort::Quantity => "b.quantity",
            BookSort::ImportDate => "b.import_date",
            BookSort::BorrowedCount => "borrowed_count",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Book query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive search in name, author and publisher
    pub q: Option<String>,
    /// Exact category name
    pub category: Option<String>,
    /// Only books with at least one copy on the shelf
    pub available_only: Option<bool>,
    pub sort: Option<BookSort>,
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Category with its current number of titles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    /// Category ID (TL001, ...)
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub book_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> BookInput {
        BookInput {
            name: "Dune".to_string(),
            category: "Science Fiction".to_string(),
            author: "Frank Herbert".to_string(),
            publisher: "Chilton Books".to_string(),
            publish_year: 1965,
            quantity: 3,
            import_date: None,
            origin: None,
        }
    }

    #[test]
    fn test_available_copies() {
        assert_eq!(available_copies(3, 1), 2);
        assert_eq!(available_copies(3, 3), 0);
        assert_eq!(available_copies(1, 4), 0);
    }

    #[test]
    fn test_valid_book() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_publish_year_bounds() {
        let mut book = input();
        book.publish_year = 999;
        assert!(book.validate().is_err());

        book.publish_year = Utc::now().year() + 5;
        assert!(book.validate().is_ok());

        book.publish_year = Utc::now().year() + 6;
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_required_fields() {
        let mut book = input();
        book.name = String::new();
        book.quantity = -1;
        let errors = book.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("quantity"));
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut book = input();
        book.name = "   ".to_string();
        book.category = "  ".to_string();
        book.author = " ".to_string();
        book.publisher = "\t".to_string();
        let errors = book.validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "category", "author", "publisher"] {
            assert!(fields.contains_key(field), "{} should be rejected", field);
        }
    }

    #[test]
    fn test_origin_carried_to_book() {
        let row = BookRow {
            id: "S001".to_string(),
            name: "Dune".to_string(),
            category: "Science Fiction".to_string(),
            author: "Frank Herbert".to_string(),
            publisher: "Chilton Books".to_string(),
            publish_year: 1965,
            quantity: 2,
            import_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            origin: Some("Donation".to_string()),
            times_borrowed: 7,
            borrowed_count: 1,
        };
        let book = Book::from(row);
        assert_eq!(book.origin.as_deref(), Some("Donation"));
        assert_eq!(book.available, 1);
    }

    #[test]
    fn test_sort_parsing() {
        let sort: BookSort = serde_json::from_str("\"publish_year\"").unwrap();
        assert_eq!(sort, BookSort::PublishYear);
        assert_eq!(sort.column(), "b.publish_year");
        assert_eq!(SortOrder::default().as_sql(), "ASC");
    }
}
