//! Librarian (staff) model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::validate_non_blank;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Librarian {
    /// Librarian ID (TT001, ...)
    pub id: String,
    pub name: String,
    #[sqlx(rename = "birth_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LibrarianInput {
    #[validate(
        custom(function = "validate_non_blank", message = "Librarian name is required"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 25, message = "Phone number is too long"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Address is too long"))]
    pub address: Option<String>,
}
