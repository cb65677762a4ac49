//! Tool listing model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Tool model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tool {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition_notes: Option<String>,
    /// Rental fee per day
    pub rental_fee: Decimal,
    /// Refundable deposit held for the loan
    pub deposit: Decimal,
    pub photo_url: Option<String>,
    pub listed: bool,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

/// Tool with derived availability for listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolDetails {
    #[serde(flatten)]
    pub tool: Tool,
    /// No non-terminal borrow currently holds the tool
    pub available: bool,
}

/// Create tool request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTool {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition_notes: Option<String>,
    pub rental_fee: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub photo_url: Option<String>,
}

/// Update tool request (owner only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTool {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition_notes: Option<String>,
    pub rental_fee: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub photo_url: Option<String>,
    pub listed: Option<bool>,
}

/// Tool search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ToolQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Paginated tool listing
#[derive(Debug, Serialize, ToSchema)]
pub struct ToolPage {
    pub tools: Vec<ToolDetails>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}
