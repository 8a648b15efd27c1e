//! Reader notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Overdue,
    NewBorrow,
    General,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Overdue => "overdue",
            NotificationType::NewBorrow => "new_borrow",
            NotificationType::General => "general",
        }
    }

    /// Lenient parsing: unknown kinds become `General`
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid notification type received: {}. Defaulting to 'general'", s);
            NotificationType::General
        })
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overdue" => Ok(NotificationType::Overdue),
            "new_borrow" => Ok(NotificationType::NewBorrow),
            "general" => Ok(NotificationType::General),
            _ => Err(format!("Invalid notification type: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for NotificationType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for NotificationType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for NotificationType {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Notification addressed to a reader
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    /// Reader ID
    #[sqlx(rename = "reader_id")]
    pub user_id: String,
    pub lending_record_id: Option<i32>,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "notification_type")]
    pub notification_type: NotificationType,
    #[sqlx(rename = "created_at")]
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// Create notification request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateNotification {
    pub user_id: String,
    pub message: String,
    /// "overdue", "new_borrow" or "general"; anything else is stored as "general"
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Create even when an identical unread notification exists
    #[serde(default)]
    pub skip_duplicate_check: bool,
}

/// Notification ready for insertion
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub reader_id: String,
    pub lending_record_id: Option<i32>,
    pub message: String,
    pub notification_type: NotificationType,
}

/// Mark-read request: one notification, or all of a reader's
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    pub notification_id: Option<i32>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub mark_all: bool,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct NotificationQuery {
    /// Reader ID
    pub user_id: String,
}

pub fn new_borrow_message(book_name: &str, due_date: DateTime<Utc>) -> String {
    format!(
        "You borrowed \"{}\". Please return it by {}.",
        book_name,
        due_date.format("%Y-%m-%d")
    )
}

pub fn overdue_message(book_name: &str, due_date: DateTime<Utc>) -> String {
    format!(
        "\"{}\" was due on {}. Please return it as soon as possible.",
        book_name,
        due_date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_type_parsing() {
        assert_eq!(NotificationType::parse_lenient("overdue"), NotificationType::Overdue);
        assert_eq!(NotificationType::parse_lenient("NEW_BORROW"), NotificationType::NewBorrow);
        assert_eq!(NotificationType::parse_lenient("reminder"), NotificationType::General);
    }

    #[test]
    fn test_type_serialization() {
        assert_eq!(serde_json::to_string(&NotificationType::NewBorrow).unwrap(), "\"new_borrow\"");
    }

    #[test]
    fn test_notification_json_uses_type_key() {
        let notification = Notification {
            id: 7,
            user_id: "BD001".to_string(),
            lending_record_id: None,
            message: "Hello".to_string(),
            notification_type: NotificationType::General,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            is_read: false,
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["type"], "general");
        assert_eq!(json["user_id"], "BD001");
        assert_eq!(json["is_read"], false);
    }

    #[test]
    fn test_messages_include_due_date() {
        let due = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        assert_eq!(
            overdue_message("Dune", due),
            "\"Dune\" was due on 2024-05-15. Please return it as soon as possible."
        );
        assert!(new_borrow_message("Dune", due).contains("2024-05-15"));
    }
}
