use sqlx::PgPool;

use crate::notifications::models::{Notification, NotificationKind};

/// Repository for user notifications
#[derive(Clone)]
pub struct NotificationsRepository {
    pool: PgPool,
}

impl NotificationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a notification for a user
    pub async fn insert(
        &self,
        user_id: i32,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, kind, title, body, created_at, read_at
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await
    }

    /// All notifications for a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, body, created_at, read_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Mark a notification as read; returns the updated row if it exists
    /// and belongs to the user
    pub async fn mark_read(
        &self,
        notification_id: i32,
        user_id: i32,
    ) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read_at = NOW()
            WHERE id = $1 AND user_id = $2 AND read_at IS NULL
            RETURNING id, user_id, kind, title, body, created_at, read_at
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
