//! Librarian (staff) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::librarian::{Librarian, LibrarianInput},
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/librarians",
    tag = "librarians",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All librarians", body = Vec<Librarian>),
        (status = 403, description = "Librarian privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_librarians(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Librarian>>> {
    claims.require_librarian()?;

    let librarians = state.services.readers.list_librarians().await?;
    Ok(Json(librarians))
}

#[utoipa::path(
    get,
    path = "/librarians/{id}",
    tag = "librarians",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Librarian ID")),
    responses(
        (status = 200, description = "Librarian details", body = Librarian),
        (status = 404, description = "Librarian not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Librarian>> {
    claims.require_librarian()?;

    let librarian = state.services.readers.get_librarian(&id).await?;
    Ok(Json(librarian))
}

#[utoipa::path(
    post,
    path = "/librarians",
    tag = "librarians",
    security(("bearer_auth" = [])),
    request_body = LibrarianInput,
    responses(
        (status = 201, description = "Librarian created", body = Librarian),
        (status = 400, description = "Invalid librarian data", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<LibrarianInput>,
) -> AppResult<(StatusCode, Json<Librarian>)> {
    claims.require_librarian()?;

    let librarian = state.services.readers.create_librarian(&input).await?;
    Ok((StatusCode::CREATED, Json(librarian)))
}
