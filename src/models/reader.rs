//! Reader (patron) model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validate_non_blank;

/// Reader account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reader {
    /// Reader ID (BD001, BD002, ...)
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[sqlx(rename = "birth_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

/// Create or replace reader request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReaderInput {
    #[validate(
        custom(function = "validate_non_blank", message = "Reader name is required"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: String,
    #[validate(length(max = 25, message = "Phone number is too long"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Address is too long"))]
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 10, message = "Gender is too long"))]
    pub gender: Option<String>,
}

/// Reader query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReaderQuery {
    /// Search in ID, name and phone
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
