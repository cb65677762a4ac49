//! Counterparty rating endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::rating::{CreateRating, Rating, RatingSummary},
};

use super::AuthenticatedAccount;

/// Rate the counterparty of a returned borrow
#[utoipa::path(
    post,
    path = "/borrows/{id}/rating",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow ID")),
    request_body = CreateRating,
    responses(
        (status = 201, description = "Rating recorded", body = Rating),
        (status = 403, description = "Not a party"),
        (status = 409, description = "Already rated or not returned")
    )
)]
pub async fn create_rating(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
    Json(request): Json<CreateRating>,
) -> AppResult<(StatusCode, Json<Rating>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let rating = state.services.ratings.rate(id, &claims, request).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

/// Ratings received by an account
#[utoipa::path(
    get,
    path = "/accounts/{id}/ratings",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Rating summary", body = RatingSummary),
        (status = 404, description = "Account not found")
    )
)]
pub async fn list_account_ratings(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(_claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<RatingSummary>> {
    let summary = state.services.ratings.summary_for_account(id).await?;
    Ok(Json(summary))
}
