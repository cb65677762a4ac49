//! In-app notification service

use crate::{
    error::AppResult,
    models::notification::{Notification, NotificationQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Notifications for the calling account
    pub async fn list(&self, account_id: i32, query: &NotificationQuery) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_for_account(account_id, query).await
    }

    /// Mark one notification read
    pub async fn mark_read(&self, id: i32, account_id: i32) -> AppResult<()> {
        self.repository.notifications.mark_read(id, account_id).await
    }

    /// Mark all notifications read; returns the number updated
    pub async fn mark_all_read(&self, account_id: i32) -> AppResult<u64> {
        self.repository.notifications.mark_all_read(account_id).await
    }
}
