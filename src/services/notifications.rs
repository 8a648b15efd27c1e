//! Reader notifications and the overdue scan

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Claims,
        notification::{CreateNotification, MarkReadRequest, NewNotification, Notification, NotificationType},
    },
    repository::Repository,
};

/// Outcome of a mark-read request
pub enum MarkReadOutcome {
    One(Notification),
    All(Vec<Notification>),
}

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Notifications of a reader, newest first (empty for unknown readers)
    pub async fn list(&self, claims: &Claims, reader_id: &str) -> AppResult<Vec<Notification>> {
        claims.require_self_or_librarian(reader_id)?;
        self.repository.notifications.list_for_reader(reader_id).await
    }

    /// Returns the notification and whether it was newly created
    pub async fn create(&self, request: &CreateNotification) -> AppResult<(Notification, bool)> {
        if request.message.trim().is_empty() {
            return Err(AppError::Validation("message: Message is required".to_string()));
        }

        let new = NewNotification {
            reader_id: request.user_id.trim().to_string(),
            lending_record_id: None,
            message: request.message.clone(),
            notification_type: NotificationType::parse_lenient(&request.notification_type),
        };

        self.repository
            .notifications
            .create(&new, !request.skip_duplicate_check)
            .await
    }

    pub async fn mark_read(&self, claims: &Claims, request: &MarkReadRequest) -> AppResult<MarkReadOutcome> {
        match request {
            MarkReadRequest { notification_id: Some(id), .. } => {
                let notification = self.repository.notifications.get_by_id(*id).await?;
                claims.require_self_or_librarian(&notification.user_id)?;
                let notification = self.repository.notifications.mark_read(*id).await?;
                Ok(MarkReadOutcome::One(notification))
            }
            MarkReadRequest { user_id: Some(reader_id), mark_all: true, .. } => {
                claims.require_self_or_librarian(reader_id)?;
                let updated = self.repository.notifications.mark_all_read(reader_id).await?;
                tracing::debug!("Marked {} notifications read for {}", updated, reader_id);
                let all = self.repository.notifications.list_for_reader(reader_id).await?;
                Ok(MarkReadOutcome::All(all))
            }
            _ => Err(AppError::BadRequest(
                "Provide notification_id, or user_id with mark_all".to_string(),
            )),
        }
    }

    pub async fn unread_count(&self, claims: &Claims, reader_id: &str) -> AppResult<i64> {
        claims.require_self_or_librarian(reader_id)?;
        self.repository.notifications.unread_count(reader_id).await
    }

    /// Notify readers of overdue loans; returns the number of notifications created
    pub async fn scan_overdue(&self) -> AppResult<u64> {
        let created = self.repository.notifications.scan_overdue(Utc::now()).await?;
        if created > 0 {
            tracing::info!("Overdue scan created {} notifications", created);
        }
        Ok(created)
    }
}
