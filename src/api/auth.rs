//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::account::{Account, RegisterAccount, UpdateProfile},
};

use super::AuthenticatedAccount;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub account: Account,
}

/// Password reset request
#[derive(Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Password reset response. The token is persisted server-side; this
/// response only acknowledges the request.
#[derive(Serialize, ToSchema)]
pub struct PasswordResetResponse {
    pub status: String,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Password reset confirmation
#[derive(Deserialize, ToSchema)]
pub struct PasswordResetConfirm {
    pub token: Uuid,
    pub new_password: String,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterAccount,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Login already exists"),
        (status = 429, description = "Too many registration attempts")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterAccount>,
) -> AppResult<(StatusCode, Json<Account>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let account = state.services.accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Authenticate and obtain a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, account) = state
        .services
        .accounts
        .authenticate(&request.login, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        account,
    }))
}

/// Current account profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = Account),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
) -> AppResult<Json<Account>> {
    let account = state.services.accounts.get_by_id(claims.account_id).await?;
    Ok(Json(account))
}

/// Update own profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Account),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Current password incorrect")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Json(request): Json<UpdateProfile>,
) -> AppResult<Json<Account>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let account = state
        .services
        .accounts
        .update_profile(claims.account_id, request)
        .await?;
    Ok(Json(account))
}

/// Request a password reset token
#[utoipa::path(
    post,
    path = "/auth/password-reset",
    tag = "auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset recorded if the email is known", body = PasswordResetResponse),
        (status = 429, description = "Too many reset attempts")
    )
)]
pub async fn request_password_reset(
    State(state): State<crate::AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> AppResult<Json<PasswordResetResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let issued = state
        .services
        .accounts
        .request_password_reset(&request.email)
        .await?;

    Ok(Json(PasswordResetResponse {
        status: "accepted".to_string(),
        expiry_date: issued.map(|(_, expiry)| expiry),
    }))
}

/// Confirm a password reset with a token
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    tag = "auth",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password updated"),
        (status = 404, description = "Unknown token"),
        (status = 410, description = "Token expired")
    )
)]
pub async fn confirm_password_reset(
    State(state): State<crate::AppState>,
    Json(request): Json<PasswordResetConfirm>,
) -> AppResult<StatusCode> {
    state
        .services
        .accounts
        .confirm_password_reset(request.token, &request.new_password)
        .await?;
    Ok(StatusCode::OK)
}
