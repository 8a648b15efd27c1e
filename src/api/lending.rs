//! Lending endpoints: borrow, return and record queries

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::lending::{BorrowRequest, LendingQuery, LendingRecord, RecordAction},
    AppState,
};

use super::AuthenticatedUser;

/// List lending records. Readers only see their own.
#[utoipa::path(
    get,
    path = "/lending/records",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(LendingQuery),
    responses(
        (status = 200, description = "Lending records, newest first", body = Vec<LendingRecord>)
    )
)]
pub async fn list_records(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LendingQuery>,
) -> AppResult<Json<Vec<LendingRecord>>> {
    let records = state.services.lending.list_records(&claims, &query).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/lending/records/{id}",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Lending record ID")),
    responses(
        (status = 200, description = "Lending record", body = LendingRecord),
        (status = 403, description = "Record belongs to another reader", body = crate::error::ErrorResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LendingRecord>> {
    let record = state.services.lending.get_record(&claims, id).await?;
    Ok(Json(record))
}

/// Lend a book to a reader
#[utoipa::path(
    post,
    path = "/lending/records",
    tag = "lending",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book lent", body = LendingRecord),
        (status = 404, description = "Reader or book not found", body = crate::error::ErrorResponse),
        (status = 422, description = "No copy available or borrow limit reached", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<LendingRecord>)> {
    claims.require_librarian()?;

    let record = state.services.lending.borrow(&claims, &request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Apply an action to a record; "return" is the only one supported
#[utoipa::path(
    put,
    path = "/lending/records/{id}",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Lending record ID")),
    request_body = RecordAction,
    responses(
        (status = 200, description = "Book returned", body = LendingRecord),
        (status = 400, description = "Unsupported action", body = crate::error::ErrorResponse),
        (status = 409, description = "Already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_action(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<RecordAction>,
) -> AppResult<Json<LendingRecord>> {
    claims.require_librarian()?;

    if request.action != "return" {
        return Err(AppError::BadRequest(format!(
            "Unsupported action: {}",
            request.action
        )));
    }

    let record = state.services.lending.return_book(id).await?;
    Ok(Json(record))
}

#[utoipa::path(
    put,
    path = "/lending/records/{id}/return",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Lending record ID")),
    responses(
        (status = 200, description = "Book returned", body = LendingRecord),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_record(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LendingRecord>> {
    claims.require_librarian()?;

    let record = state.services.lending.return_book(id).await?;
    Ok(Json(record))
}

/// Unreturned records past their due date
#[utoipa::path(
    get,
    path = "/lending/overdue",
    tag = "lending",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue records", body = Vec<LendingRecord>)
    )
)]
pub async fn list_overdue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LendingRecord>>> {
    claims.require_librarian()?;

    let records = state.services.lending.overdue_loans().await?;
    Ok(Json(records))
}
