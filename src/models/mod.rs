//! Data models for the library server

pub mod account;
pub mod book;
pub mod lending;
pub mod librarian;
pub mod notification;
pub mod reader;
pub mod stats;

use validator::ValidationError;

// Re-export commonly used types
pub use account::{Claims, Role};
pub use book::{Book, BookInput, BookQuery, Category};
pub use lending::{LendingRecord, LendingStatus};
pub use librarian::{Librarian, LibrarianInput};
pub use notification::{Notification, NotificationType};
pub use reader::{Reader, ReaderInput, ReaderQuery};

/// Required text field: rejects empty and whitespace-only values
pub(crate) fn validate_non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert!(validate_non_blank("Dune").is_ok());
        assert!(validate_non_blank(" x ").is_ok());
        assert!(validate_non_blank("").is_err());
        assert!(validate_non_blank(" \t\n").is_err());
    }
}
