//! API handlers for Toolshed REST endpoints

pub mod accounts;
pub mod auth;
pub mod borrows;
pub mod disputes;
pub mod handovers;
pub mod health;
pub mod notifications;
pub mod openapi;
pub mod ratings;
pub mod tools;
pub mod waivers;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, models::account::AccountClaims, AppState};

/// Extractor for the authenticated account from a JWT bearer token
pub struct AuthenticatedAccount(pub AccountClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedAccount {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Authentication("Invalid authorization header format".to_string()));
        }

        let token = &auth_header[7..];

        let claims = AccountClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedAccount(claims))
    }
}
