//! Handover code endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::Borrow,
        handover::{HandoverCodeIssued, HandoverKind, VerifyHandover},
    },
};

use super::AuthenticatedAccount;

/// Verification response
#[derive(Serialize, ToSchema)]
pub struct HandoverVerified {
    pub borrow: Borrow,
    pub message: String,
}

fn parse_kind(kind: &str) -> AppResult<HandoverKind> {
    kind.parse()
        .map_err(|_| AppError::Validation(format!("Unknown handover kind '{}'", kind)))
}

/// Generate (or regenerate) a handover code
#[utoipa::path(
    post,
    path = "/borrows/{id}/handover/{kind}/code",
    tag = "handovers",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow ID"),
        ("kind" = String, Path, description = "Exchange type: pickup or return")
    ),
    responses(
        (status = 201, description = "Code issued", body = HandoverCodeIssued),
        (status = 403, description = "Not the generating party"),
        (status = 409, description = "Borrow not in the required state")
    )
)]
pub async fn generate_code(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path((id, kind)): Path<(i32, String)>,
) -> AppResult<(axum::http::StatusCode, Json<HandoverCodeIssued>)> {
    let kind = parse_kind(&kind)?;
    let code = state.services.handovers.generate(id, kind, &claims).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(HandoverCodeIssued {
            borrow_id: code.borrow_id,
            kind: code.kind,
            code: code.code,
            expiry_date: code.expiry_date,
        }),
    ))
}

/// Verify a handover code presented by the counterparty
#[utoipa::path(
    post,
    path = "/borrows/{id}/handover/{kind}/verify",
    tag = "handovers",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow ID"),
        ("kind" = String, Path, description = "Exchange type: pickup or return")
    ),
    request_body = VerifyHandover,
    responses(
        (status = 200, description = "Exchange confirmed", body = HandoverVerified),
        (status = 400, description = "Incorrect code"),
        (status = 403, description = "Not the verifying party"),
        (status = 409, description = "Borrow not in the required state"),
        (status = 410, description = "Code expired"),
        (status = 422, description = "Waiver missing")
    )
)]
pub async fn verify_code(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path((id, kind)): Path<(i32, String)>,
    Json(request): Json<VerifyHandover>,
) -> AppResult<Json<HandoverVerified>> {
    let kind = parse_kind(&kind)?;
    let borrow = state
        .services
        .handovers
        .verify(id, kind, &claims, &request)
        .await?;

    let message = match kind {
        HandoverKind::Pickup => "Pickup confirmed, borrow is active".to_string(),
        HandoverKind::Return => "Return confirmed, borrow is complete".to_string(),
    };

    Ok(Json(HandoverVerified { borrow, message }))
}
