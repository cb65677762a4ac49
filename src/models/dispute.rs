//! Dispute escalation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Dispute status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Open,
    Resolved,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DisputeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(DisputeStatus::Open),
            "resolved" => Ok(DisputeStatus::Resolved),
            _ => Err(format!("Invalid dispute status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for DisputeStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for DisputeStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for DisputeStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Dispute row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Dispute {
    pub id: i32,
    pub borrow_id: i32,
    pub opened_by: i32,
    pub subject: String,
    pub status: DisputeStatus,
    pub resolution_note: Option<String>,
    pub opened_date: DateTime<Utc>,
    pub resolved_date: Option<DateTime<Utc>>,
}

/// One message in a dispute thread
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DisputeMessage {
    pub id: i32,
    pub dispute_id: i32,
    pub author_id: i32,
    pub body: String,
    pub created_date: DateTime<Utc>,
}

/// Dispute with its message thread
#[derive(Debug, Serialize, ToSchema)]
pub struct DisputeDetails {
    #[serde(flatten)]
    pub dispute: Dispute,
    pub messages: Vec<DisputeMessage>,
}

/// Open dispute request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OpenDispute {
    #[validate(length(min = 3, message = "Subject must be at least 3 characters"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message body required"))]
    pub body: String,
}

/// Post message request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PostDisputeMessage {
    #[validate(length(min = 1, message = "Message body required"))]
    pub body: String,
}

/// Resolve dispute request (admin only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolveDispute {
    #[validate(length(min = 1, message = "Resolution note required"))]
    pub resolution_note: String,
}

/// Dispute listing filter (admin)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DisputeQuery {
    pub status: Option<DisputeStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
