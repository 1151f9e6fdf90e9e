use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::models::{CreateNotification, NotificationPatch, NotificationRecord};
use crate::error::{AppError, AppResult};
use crate::services::feed::{FeedCursor, NotificationStore, Page};

// ============================================================================
// Notification Store (SQLite)
// ============================================================================

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: String,
    user_id: String,
    title: String,
    message: String,
    notification_type: String,
    job_id: Option<String>,
    timestamp: NaiveDateTime,
    read: bool,
}

impl TryFrom<NotificationRow> for NotificationRecord {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let notification_type = row.notification_type.parse().map_err(|e: String| {
            tracing::warn!("Notification {} has an unreadable type: {}", row.id, e);
            AppError::Internal(anyhow::anyhow!(e))
        })?;

        Ok(NotificationRecord {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            message: row.message,
            notification_type,
            job_id: row.job_id,
            timestamp: row.timestamp,
            read: row.read,
        })
    }
}

/// `NotificationStore` backed by the `notifications` table.
///
/// Timestamps are assigned here and never go backwards within one store
/// instance, so records created in quick succession still order by creation.
pub struct SqliteNotificationStore {
    pool: SqlitePool,
    last_timestamp: Mutex<Option<NaiveDateTime>>,
}

impl SqliteNotificationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            last_timestamp: Mutex::new(None),
        }
    }

    async fn next_timestamp(&self) -> NaiveDateTime {
        let mut last = self.last_timestamp.lock().await;
        let now = Utc::now().naive_utc();
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }

    /// Number of unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count)
    }
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn fetch_page(
        &self,
        user_id: &str,
        page_size: usize,
        cursor: Option<&FeedCursor>,
    ) -> AppResult<Page> {
        let limit = page_size as i64;

        let rows = match cursor {
            None => {
                sqlx::query_as::<_, NotificationRow>(
                    r#"
                    SELECT id, user_id, title, message, notification_type, job_id, timestamp, read
                    FROM notifications
                    WHERE user_id = ?
                    ORDER BY timestamp DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            Some(cursor) => {
                sqlx::query_as::<_, NotificationRow>(
                    r#"
                    SELECT id, user_id, title, message, notification_type, job_id, timestamp, read
                    FROM notifications
                    WHERE user_id = ?
                      AND (timestamp < ? OR (timestamp = ? AND id < ?))
                    ORDER BY timestamp DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(user_id)
                .bind(cursor.timestamp)
                .bind(cursor.timestamp)
                .bind(&cursor.id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(AppError::Database)?;

        let records = rows
            .into_iter()
            .map(NotificationRecord::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page::new(records))
    }

    async fn update(&self, user_id: &str, id: &str, patch: NotificationPatch) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = COALESCE(?, read)
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(patch.read)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("notification {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            tracing::debug!("Delete of notification {} matched nothing", id);
        }
        Ok(())
    }

    async fn create(&self, notification: CreateNotification) -> AppResult<String> {
        notification.validate().map_err(AppError::Validation)?;

        let id = Uuid::new_v4().to_string();
        let timestamp = self.next_timestamp().await;

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, title, message, notification_type, job_id, timestamp, read
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&id)
        .bind(&notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notification_type.as_str())
        .bind(&notification.job_id)
        .bind(timestamp)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        tracing::debug!(
            "Created {} notification {} for user {}",
            notification.notification_type,
            id,
            notification.user_id
        );
        Ok(id)
    }
}
