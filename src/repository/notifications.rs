//! Notifications repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::notification::{Notification, NotificationKind, NotificationQuery},
};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a notification for an account
    pub async fn create(
        &self,
        account_id: i32,
        kind: NotificationKind,
        borrow_id: Option<i32>,
        body: &str,
    ) -> AppResult<Notification> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (account_id, kind, borrow_id, body, read, created_date)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(kind.as_str())
        .bind(borrow_id)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Notifications for an account, newest first
    pub async fn list_for_account(
        &self,
        account_id: i32,
        query: &NotificationQuery,
    ) -> AppResult<Vec<Notification>> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(50).clamp(1, 200);
        let offset = (page - 1) * per_page;

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE account_id = $1
              AND (NOT $2 OR NOT read)
            ORDER BY created_date DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(account_id)
        .bind(query.unread.unwrap_or(false))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Mark one notification read; only its owner may
    pub async fn mark_read(&self, id: i32, account_id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND account_id = $2",
        )
        .bind(id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Notification with id {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Mark all of an account's notifications read
    pub async fn mark_all_read(&self, account_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE account_id = $1 AND NOT read",
        )
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
