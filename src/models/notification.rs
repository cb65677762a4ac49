//! In-app notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Notification kinds, written by the borrow lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BorrowRequested,
    BorrowApproved,
    BorrowDenied,
    BorrowCancelled,
    PickupConfirmed,
    ReturnConfirmed,
    DisputeOpened,
    DisputeResolved,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BorrowRequested => "borrow_requested",
            NotificationKind::BorrowApproved => "borrow_approved",
            NotificationKind::BorrowDenied => "borrow_denied",
            NotificationKind::BorrowCancelled => "borrow_cancelled",
            NotificationKind::PickupConfirmed => "pickup_confirmed",
            NotificationKind::ReturnConfirmed => "return_confirmed",
            NotificationKind::DisputeOpened => "dispute_opened",
            NotificationKind::DisputeResolved => "dispute_resolved",
        }
    }
}

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub account_id: i32,
    pub kind: String,
    pub borrow_id: Option<i32>,
    pub body: String,
    pub read: bool,
    pub created_date: DateTime<Utc>,
}

/// Notification listing filter
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct NotificationQuery {
    /// Only unread notifications
    pub unread: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
