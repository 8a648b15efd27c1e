//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, lending, librarians, notifications, readers, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Server API",
        version = "1.0.0",
        description = "Catalog, readers, librarians, lending and notifications REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::change_password,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_categories,
        // Readers
        readers::list_readers,
        readers::get_reader,
        readers::create_reader,
        readers::update_reader,
        readers::delete_reader,
        // Librarians
        librarians::list_librarians,
        librarians::get_librarian,
        librarians::create_librarian,
        // Lending
        lending::list_records,
        lending::get_record,
        lending::borrow,
        lending::record_action,
        lending::return_record,
        lending::list_overdue,
        // Notifications
        notifications::list_notifications,
        notifications::create_notification,
        notifications::mark_read,
        notifications::unread_count,
        notifications::overdue_scan,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ProfileResponse,
            auth::ChangePasswordRequest,
            crate::services::auth::AccountInfo,
            crate::models::account::Role,
            // Books
            crate::models::book::Book,
            crate::models::book::BookInput,
            crate::models::book::BookSort,
            crate::models::book::SortOrder,
            crate::models::book::Category,
            crate::api::BookPage,
            // Readers and librarians
            crate::models::reader::Reader,
            crate::models::reader::ReaderInput,
            crate::api::ReaderPage,
            crate::models::librarian::Librarian,
            crate::models::librarian::LibrarianInput,
            // Lending
            crate::models::lending::LendingRecord,
            crate::models::lending::LendingStatus,
            crate::models::lending::BorrowRequest,
            crate::models::lending::RecordAction,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationType,
            crate::models::notification::CreateNotification,
            crate::models::notification::MarkReadRequest,
            notifications::MarkReadResponse,
            notifications::UnreadCountResponse,
            notifications::OverdueScanResponse,
            // Stats
            crate::models::stats::LibraryStats,
            crate::models::stats::TopBook,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "readers", description = "Reader management"),
        (name = "librarians", description = "Librarian management"),
        (name = "lending", description = "Borrowing and returns"),
        (name = "notifications", description = "Reader notifications"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` JWT scheme referenced by the paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_lending_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/lending/records"));
        assert!(doc.paths.paths.contains_key("/lending/records/{id}/return"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_page_schemas_registered() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/books"));
        assert!(doc.paths.paths.contains_key("/readers"));

        let components = doc.components.expect("components");
        assert!(components.schemas.contains_key("BookPage"));
        assert!(components.schemas.contains_key("ReaderPage"));
    }
}
