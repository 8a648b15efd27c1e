//! Notification endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::notification::{CreateNotification, MarkReadRequest, Notification, NotificationQuery},
    services::notifications::MarkReadOutcome,
    AppState,
};

use super::AuthenticatedUser;

/// Either the notification that was marked, or the reader's full list
#[derive(Serialize, ToSchema)]
pub struct MarkReadResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<Notification>>,
}

#[derive(Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub user_id: String,
    pub unread_count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct OverdueScanResponse {
    /// Notifications created by this scan
    pub created: u64,
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state.services.notifications.list(&claims, &query.user_id).await?;
    Ok(Json(notifications))
}

/// Create a notification; an identical unread one is returned instead unless
/// `skip_duplicate_check` is set
#[utoipa::path(
    post,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    request_body = CreateNotification,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 200, description = "Existing unread duplicate", body = Notification),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_notification(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateNotification>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    claims.require_self_or_librarian(request.user_id.trim())?;

    let (notification, created) = state.services.notifications.create(&request).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(notification)))
}

#[utoipa::path(
    put,
    path = "/notifications/mark-read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Marked as read", body = MarkReadResponse),
        (status = 400, description = "Neither notification_id nor user_id with mark_all", body = crate::error::ErrorResponse),
        (status = 404, description = "Notification not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<MarkReadRequest>,
) -> AppResult<Json<MarkReadResponse>> {
    let response = match state.services.notifications.mark_read(&claims, &request).await? {
        MarkReadOutcome::One(notification) => MarkReadResponse {
            notification: Some(notification),
            notifications: None,
        },
        MarkReadOutcome::All(notifications) => MarkReadResponse {
            notification: None,
            notifications: Some(notifications),
        },
    };

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(NotificationQuery),
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse)
    )
)]
pub async fn unread_count(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<UnreadCountResponse>> {
    let unread_count = state
        .services
        .notifications
        .unread_count(&claims, &query.user_id)
        .await?;

    Ok(Json(UnreadCountResponse {
        user_id: query.user_id,
        unread_count,
    }))
}

/// Notify readers about overdue loans
#[utoipa::path(
    post,
    path = "/notifications/overdue-scan",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Scan finished", body = OverdueScanResponse),
        (status = 403, description = "Librarian privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn overdue_scan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<OverdueScanResponse>> {
    claims.require_librarian()?;

    let created = state.services.notifications.scan_overdue().await?;
    Ok(Json(OverdueScanResponse { created }))
}
