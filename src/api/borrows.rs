//! Borrow lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::borrow::{Borrow, BorrowDetails, BorrowQuery, CreateBorrow},
};

use super::AuthenticatedAccount;

/// Response for transitions that issue a handover code alongside
#[derive(Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub borrow: Borrow,
    /// Pickup code to hand to the borrower out of band
    pub pickup_code: String,
    pub pickup_code_expiry: DateTime<Utc>,
}

/// Plain transition response
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    pub borrow: Borrow,
    pub message: String,
}

/// Request to borrow a tool
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Borrow requested", body = Borrow),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Tool not found"),
        (status = 409, description = "Tool already has an open borrow"),
        (status = 429, description = "Too many borrow requests")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<Borrow>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let borrow = state.services.borrows.request(claims.account_id, request).await?;
    Ok((StatusCode::CREATED, Json(borrow)))
}

/// List borrows where the caller is a party (all borrows for admins)
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(BorrowQuery),
    responses(
        (status = 200, description = "Borrows", body = Vec<BorrowDetails>)
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    let borrows = state.services.borrows.list(&claims, &query).await?;
    Ok(Json(borrows))
}

/// Get one borrow with details
#[utoipa::path(
    get,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Borrow details", body = BorrowDetails),
        (status = 403, description = "Not a party"),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn get_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowDetails>> {
    let details = state.services.borrows.get_details(id, &claims).await?;
    Ok(Json(details))
}

/// Approve a borrow request (lender only)
#[utoipa::path(
    post,
    path = "/borrows/{id}/approve",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Approved, pickup code issued", body = ApprovalResponse),
        (status = 403, description = "Not the lender"),
        (status = 409, description = "Not in the requested state")
    )
)]
pub async fn approve_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<ApprovalResponse>> {
    let (borrow, code) = state.services.borrows.approve(id, &claims).await?;

    Ok(Json(ApprovalResponse {
        borrow,
        pickup_code: code.code,
        pickup_code_expiry: code.expiry_date,
    }))
}

/// Deny a borrow request (lender only)
#[utoipa::path(
    post,
    path = "/borrows/{id}/deny",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Denied", body = BorrowResponse),
        (status = 403, description = "Not the lender"),
        (status = 409, description = "Not in the requested state")
    )
)]
pub async fn deny_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowResponse>> {
    let borrow = state.services.borrows.deny(id, &claims).await?;
    Ok(Json(BorrowResponse {
        borrow,
        message: "Borrow request denied".to_string(),
    }))
}

/// Cancel a borrow (borrower only, before pickup)
#[utoipa::path(
    post,
    path = "/borrows/{id}/cancel",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Cancelled", body = BorrowResponse),
        (status = 403, description = "Not the borrower"),
        (status = 409, description = "Already active or terminal")
    )
)]
pub async fn cancel_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowResponse>> {
    let borrow = state.services.borrows.cancel(id, &claims).await?;
    Ok(Json(BorrowResponse {
        borrow,
        message: "Borrow cancelled".to_string(),
    }))
}

/// Extend an active borrow's due date (borrower only, bounded)
#[utoipa::path(
    post,
    path = "/borrows/{id}/extend",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Due date extended", body = BorrowResponse),
        (status = 403, description = "Not the borrower"),
        (status = 409, description = "Not active"),
        (status = 422, description = "Maximum extensions reached")
    )
)]
pub async fn extend_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowResponse>> {
    let borrow = state.services.borrows.extend(id, &claims).await?;
    let message = format!(
        "Due date extended ({} extensions used)",
        borrow.nb_extensions
    );
    Ok(Json(BorrowResponse { borrow, message }))
}
