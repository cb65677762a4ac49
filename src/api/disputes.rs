//! Dispute escalation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::dispute::{
        Dispute, DisputeDetails, DisputeMessage, DisputeQuery, OpenDispute, PostDisputeMessage,
        ResolveDispute,
    },
};

use super::AuthenticatedAccount;

/// Paginated dispute listing (admin)
#[derive(Serialize, ToSchema)]
pub struct DisputeList {
    pub disputes: Vec<Dispute>,
    pub total: i64,
}

/// Open a dispute against a borrow
#[utoipa::path(
    post,
    path = "/borrows/{id}/dispute",
    tag = "disputes",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    request_body = OpenDispute,
    responses(
        (status = 201, description = "Dispute opened", body = Dispute),
        (status = 403, description = "Not a party"),
        (status = 409, description = "Dispute already exists or request undecided")
    )
)]
pub async fn open_dispute(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
    Json(request): Json<OpenDispute>,
) -> AppResult<(StatusCode, Json<Dispute>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let dispute = state.services.disputes.open(id, &claims, request).await?;
    Ok((StatusCode::CREATED, Json(dispute)))
}

/// Dispute with its message thread
#[utoipa::path(
    get,
    path = "/disputes/{id}",
    tag = "disputes",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Dispute ID")),
    responses(
        (status = 200, description = "Dispute details", body = DisputeDetails),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Dispute not found")
    )
)]
pub async fn get_dispute(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<DisputeDetails>> {
    let details = state.services.disputes.get_details(id, &claims).await?;
    Ok(Json(details))
}

/// Post a message to an open dispute thread
#[utoipa::path(
    post,
    path = "/disputes/{id}/messages",
    tag = "disputes",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Dispute ID")),
    request_body = PostDisputeMessage,
    responses(
        (status = 201, description = "Message posted", body = DisputeMessage),
        (status = 403, description = "Not a participant"),
        (status = 409, description = "Dispute is resolved")
    )
)]
pub async fn post_message(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
    Json(request): Json<PostDisputeMessage>,
) -> AppResult<(StatusCode, Json<DisputeMessage>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = state
        .services
        .disputes
        .post_message(id, &claims, request)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Resolve a dispute (admin only)
#[utoipa::path(
    post,
    path = "/disputes/{id}/resolve",
    tag = "disputes",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Dispute ID")),
    request_body = ResolveDispute,
    responses(
        (status = 200, description = "Dispute resolved", body = Dispute),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Already resolved")
    )
)]
pub async fn resolve_dispute(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
    Json(request): Json<ResolveDispute>,
) -> AppResult<Json<Dispute>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let dispute = state.services.disputes.resolve(id, &claims, request).await?;
    Ok(Json(dispute))
}

/// List disputes (admin only)
#[utoipa::path(
    get,
    path = "/disputes",
    tag = "disputes",
    security(("bearer_auth" = [])),
    params(DisputeQuery),
    responses(
        (status = 200, description = "Disputes", body = DisputeList),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_disputes(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Query(query): Query<DisputeQuery>,
) -> AppResult<Json<DisputeList>> {
    let (disputes, total) = state.services.disputes.list(&claims, &query).await?;
    Ok(Json(DisputeList { disputes, total }))
}
