//! Notifications repository

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::notification::{overdue_message, NewNotification, Notification, NotificationType},
};

const NOTIFICATION_COLUMNS: &str =
    "id, reader_id, lending_record_id, message, notification_type, created_at, is_read";

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Notifications of a reader, newest first
    pub async fn list_for_reader(&self, reader_id: &str) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE reader_id = $1 ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        ))
        .bind(reader_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {} FROM notifications WHERE id = $1",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification with id {} not found", id)))
    }

    /// Create a notification for an existing reader.
    ///
    /// With `check_duplicate`, an unread notification of the same type and
    /// message is returned instead. The boolean is true when a row was created.
    pub async fn create(
        &self,
        new: &NewNotification,
        check_duplicate: bool,
    ) -> AppResult<(Notification, bool)> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent creations for the same reader
        sqlx::query_scalar::<_, String>("SELECT id FROM readers WHERE id = $1 FOR UPDATE")
            .bind(&new.reader_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", new.reader_id)))?;

        if check_duplicate {
            let existing = sqlx::query_as::<_, Notification>(&format!(
                r#"
                SELECT {} FROM notifications
                WHERE reader_id = $1 AND notification_type = $2 AND message = $3 AND is_read = FALSE
                ORDER BY created_at DESC
                LIMIT 1
                "#,
                NOTIFICATION_COLUMNS
            ))
            .bind(&new.reader_id)
            .bind(new.notification_type)
            .bind(&new.message)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(existing) = existing {
                tracing::debug!("Duplicate notification for reader {}, returning {}", new.reader_id, existing.id);
                tx.commit().await?;
                return Ok((existing, false));
            }
        }

        let notification = insert(&mut tx, new).await?;
        tx.commit().await?;
        Ok((notification, true))
    }

    /// Mark one notification as read
    pub async fn mark_read(&self, id: i32) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {}",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification with id {} not found", id)))
    }

    /// Mark all unread notifications of a reader as read
    pub async fn mark_all_read(&self, reader_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE reader_id = $1 AND is_read = FALSE",
        )
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, reader_id: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE reader_id = $1 AND is_read = FALSE",
        )
        .bind(reader_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Create an overdue notification for every unreturned record past its due
    /// date that has no unread overdue notification yet. Returns the number created.
    pub async fn scan_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        // Concurrent scans would otherwise both see the record as unnotified
        sqlx::query("LOCK TABLE notifications IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let overdue = sqlx::query_as::<_, (i32, String, String, DateTime<Utc>)>(
            r#"
            SELECT lr.id, lr.reader_id, lr.book_name, lr.due_date
            FROM lending_records lr
            WHERE lr.return_date IS NULL
              AND lr.due_date < $1
              AND NOT EXISTS (
                  SELECT 1 FROM notifications n
                  WHERE n.lending_record_id = lr.id
                    AND n.notification_type = 'overdue'
                    AND n.is_read = FALSE
              )
            ORDER BY lr.due_date
            "#,
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let mut created = 0;
        for (record_id, reader_id, book_name, due_date) in overdue {
            let new = NewNotification {
                reader_id,
                lending_record_id: Some(record_id),
                message: overdue_message(&book_name, due_date),
                notification_type: NotificationType::Overdue,
            };
            insert(&mut tx, &new).await?;
            created += 1;
        }

        tx.commit().await?;
        Ok(created)
    }
}

/// Insert a notification on an open connection or transaction
pub(crate) async fn insert(conn: &mut PgConnection, new: &NewNotification) -> AppResult<Notification> {
    let notification = sqlx::query_as::<_, Notification>(&format!(
        r#"
        INSERT INTO notifications (reader_id, lending_record_id, message, notification_type, created_at, is_read)
        VALUES ($1, $2, $3, $4, NOW(), FALSE)
        RETURNING {}
        "#,
        NOTIFICATION_COLUMNS
    ))
    .bind(&new.reader_id)
    .bind(new.lending_record_id)
    .bind(&new.message)
    .bind(new.notification_type)
    .fetch_one(&mut *conn)
    .await?;

    Ok(notification)
}
