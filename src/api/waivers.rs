//! Liability waiver endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::waiver::{SignWaiver, Waiver},
};

use super::AuthenticatedAccount;

/// Sign the waiver for a borrow (borrower only)
#[utoipa::path(
    post,
    path = "/borrows/{id}/waiver",
    tag = "waivers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    request_body = SignWaiver,
    responses(
        (status = 201, description = "Waiver signed", body = Waiver),
        (status = 403, description = "Not the borrower"),
        (status = 409, description = "Waiver already on file or wrong state")
    )
)]
pub async fn sign_waiver(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
    Json(request): Json<SignWaiver>,
) -> AppResult<(StatusCode, Json<Waiver>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let waiver = state.services.waivers.sign(id, &claims, request).await?;
    Ok((StatusCode::CREATED, Json(waiver)))
}

/// Waiver on file for a borrow
#[utoipa::path(
    get,
    path = "/borrows/{id}/waiver",
    tag = "waivers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    responses(
        (status = 200, description = "Waiver", body = Waiver),
        (status = 403, description = "Not a party"),
        (status = 404, description = "No waiver on file")
    )
)]
pub async fn get_waiver(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<Waiver>> {
    let waiver = state.services.waivers.get(id, &claims).await?;
    Ok(Json(waiver))
}
