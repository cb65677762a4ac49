//! Handover code model: a short-lived shared secret proving physical
//! tool exchange at pickup or return.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use super::borrow::BorrowRole;

/// Codes are uppercase alphanumeric, without the lookalikes 0/O and 1/I
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

static CODE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z2-9]{4,16}$").unwrap());

/// Exchange type the code is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HandoverKind {
    Pickup,
    Return,
}

impl HandoverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoverKind::Pickup => "pickup",
            HandoverKind::Return => "return",
        }
    }

    /// The party that generates codes of this kind. Pickup codes come from
    /// the lender, return codes from the borrower.
    pub fn generator(&self) -> BorrowRole {
        match self {
            HandoverKind::Pickup => BorrowRole::Lender,
            HandoverKind::Return => BorrowRole::Borrower,
        }
    }

    /// The only party allowed to verify: the counterparty of the generator
    pub fn verifier(&self) -> BorrowRole {
        match self {
            HandoverKind::Pickup => BorrowRole::Borrower,
            HandoverKind::Return => BorrowRole::Lender,
        }
    }
}

impl std::fmt::Display for HandoverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HandoverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pickup" => Ok(HandoverKind::Pickup),
            "return" => Ok(HandoverKind::Return),
            _ => Err(format!("Invalid handover kind: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for HandoverKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for HandoverKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for HandoverKind {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Handover code row. A code is active while `verified_date` is null,
/// `superseded` is false and `expiry_date` is in the future.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HandoverCode {
    pub id: i32,
    pub borrow_id: i32,
    pub kind: HandoverKind,
    #[serde(skip_serializing)]
    pub code: String,
    pub expiry_date: DateTime<Utc>,
    pub created_date: DateTime<Utc>,
    pub verified_date: Option<DateTime<Utc>>,
    pub superseded: bool,
    /// Condition notes recorded by the verifier at the exchange
    pub condition_notes: Option<String>,
}

impl HandoverCode {
    /// Single-use and deterministic wall-clock expiry, independent of
    /// attempt count
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.verified_date.is_none() && !self.superseded && now < self.expiry_date
    }
}

/// Submitted-code shape check, before any database lookup
pub fn looks_like_code(submitted: &str) -> bool {
    CODE_SHAPE.is_match(submitted)
}

/// Verify-handover request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyHandover {
    pub code: String,
    pub condition_notes: Option<String>,
}

/// Response returned on code generation. The code value is only ever
/// exposed here, to its generator.
#[derive(Debug, Serialize, ToSchema)]
pub struct HandoverCodeIssued {
    pub borrow_id: i32,
    pub kind: HandoverKind,
    pub code: String,
    pub expiry_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn code_at(expiry: DateTime<Utc>) -> HandoverCode {
        HandoverCode {
            id: 1,
            borrow_id: 1,
            kind: HandoverKind::Pickup,
            code: "ABCD2345".to_string(),
            expiry_date: expiry,
            created_date: Utc::now(),
            verified_date: None,
            superseded: false,
            condition_notes: None,
        }
    }

    #[test]
    fn roles_are_counterparties() {
        assert_eq!(HandoverKind::Pickup.generator(), BorrowRole::Lender);
        assert_eq!(HandoverKind::Pickup.verifier(), BorrowRole::Borrower);
        assert_eq!(HandoverKind::Return.generator(), BorrowRole::Borrower);
        assert_eq!(HandoverKind::Return.verifier(), BorrowRole::Lender);
    }

    #[test]
    fn code_expires_on_wall_clock_deadline() {
        let now = Utc::now();
        assert!(code_at(now + Duration::minutes(1)).is_active(now));
        assert!(!code_at(now - Duration::seconds(1)).is_active(now));
        // Boundary: expiry itself is no longer valid
        assert!(!code_at(now).is_active(now));
    }

    #[test]
    fn used_or_superseded_codes_are_inactive() {
        let now = Utc::now();
        let mut used = code_at(now + Duration::minutes(10));
        used.verified_date = Some(now);
        assert!(!used.is_active(now));

        let mut old = code_at(now + Duration::minutes(10));
        old.superseded = true;
        assert!(!old.is_active(now));
    }

    #[test]
    fn code_shape_filters_garbage() {
        assert!(looks_like_code("ABCD2345"));
        assert!(!looks_like_code("abcd2345"));
        assert!(!looks_like_code("AB"));
        assert!(!looks_like_code("ABCD 2345"));
    }
}
