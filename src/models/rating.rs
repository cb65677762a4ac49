//! Counterparty rating model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Rating row, append-only once created
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rating {
    pub id: i32,
    pub borrow_id: i32,
    pub rater_id: i32,
    pub ratee_id: i32,
    pub score: i16,
    pub comment: Option<String>,
    pub created_date: DateTime<Utc>,
}

/// Create rating request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRating {
    #[validate(range(min = 1, max = 5, message = "Score must be between 1 and 5"))]
    pub score: i16,
    #[validate(length(max = 1000, message = "Comment too long"))]
    pub comment: Option<String>,
}

/// Rating summary for an account
#[derive(Debug, Serialize, ToSchema)]
pub struct RatingSummary {
    pub account_id: i32,
    pub avg_score: Option<f64>,
    pub nb_ratings: i64,
    pub ratings: Vec<Rating>,
}
