//! Liability waiver model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Waiver row: the borrower's signed acknowledgment of tool condition and
/// liability terms. Append-only, at most one per borrow, required before
/// pickup verification succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Waiver {
    pub id: i32,
    pub borrow_id: i32,
    pub borrower_id: i32,
    pub acknowledgment: String,
    pub condition_ack: bool,
    pub signed_date: DateTime<Utc>,
}

/// Sign waiver request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignWaiver {
    #[validate(length(min = 1, message = "Acknowledgment text required"))]
    pub acknowledgment: String,
    /// Borrower confirms the tool's stated condition
    pub condition_ack: bool,
}
