//! Reader management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reader::{Reader, ReaderInput, ReaderQuery},
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/readers",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(ReaderQuery),
    responses(
        (status = 200, description = "Page of readers", body = super::ReaderPage),
        (status = 403, description = "Librarian privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_readers(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReaderQuery>,
) -> AppResult<Json<PaginatedResponse<Reader>>> {
    claims.require_librarian()?;

    let (items, total, page, per_page) = state.services.readers.list_readers(&query).await?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

/// Get a reader (librarians, or the reader themself)
#[utoipa::path(
    get,
    path = "/readers/{id}",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reader ID")),
    responses(
        (status = 200, description = "Reader details", body = Reader),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_reader(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Reader>> {
    claims.require_self_or_librarian(&id)?;

    let reader = state.services.readers.get_reader(&id).await?;
    Ok(Json(reader))
}

#[utoipa::path(
    post,
    path = "/readers",
    tag = "readers",
    security(("bearer_auth" = [])),
    request_body = ReaderInput,
    responses(
        (status = 201, description = "Reader created", body = Reader),
        (status = 400, description = "Invalid reader data", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_reader(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<ReaderInput>,
) -> AppResult<(StatusCode, Json<Reader>)> {
    claims.require_librarian()?;

    let reader = state.services.readers.create_reader(&input).await?;
    Ok((StatusCode::CREATED, Json(reader)))
}

#[utoipa::path(
    put,
    path = "/readers/{id}",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reader ID")),
    request_body = ReaderInput,
    responses(
        (status = 200, description = "Reader updated", body = Reader),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_reader(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    Json(input): Json<ReaderInput>,
) -> AppResult<Json<Reader>> {
    claims.require_librarian()?;

    let reader = state.services.readers.update_reader(&id, &input).await?;
    Ok(Json(reader))
}

#[utoipa::path(
    delete,
    path = "/readers/{id}",
    tag = "readers",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reader ID")),
    responses(
        (status = 204, description = "Reader deleted"),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Reader has unreturned books", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_reader(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    claims.require_librarian()?;

    state.services.readers.delete_reader(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
