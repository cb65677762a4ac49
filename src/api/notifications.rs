//! In-app notification endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::notification::{Notification, NotificationQuery},
};

use super::AuthenticatedAccount;

/// Bulk mark-read response
#[derive(Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}

/// Notifications for the calling account
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .services
        .notifications
        .list(claims.account_id, &query)
        .await?;
    Ok(Json(notifications))
}

/// Mark one notification read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_read(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .notifications
        .mark_read(id, claims.account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark all notifications read
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All marked read", body = MarkAllReadResponse)
    )
)]
pub async fn mark_all_read(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
) -> AppResult<Json<MarkAllReadResponse>> {
    let marked = state
        .services
        .notifications
        .mark_all_read(claims.account_id)
        .await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
