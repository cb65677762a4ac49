//! Borrow transaction model and lifecycle state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::account::AccountShort;
use crate::error::{AppError, AppResult};

/// Borrow lifecycle status, stored as text.
///
/// Awaiting-pickup and awaiting-return are not distinct stored states:
/// they are `Approved` with an outstanding pickup code and `Active` with
/// an outstanding return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Requested,
    Approved,
    Active,
    Returned,
    Denied,
    Cancelled,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Requested => "requested",
            BorrowStatus::Approved => "approved",
            BorrowStatus::Active => "active",
            BorrowStatus::Returned => "returned",
            BorrowStatus::Denied => "denied",
            BorrowStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BorrowStatus::Returned | BorrowStatus::Denied | BorrowStatus::Cancelled
        )
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(BorrowStatus::Requested),
            "approved" => Ok(BorrowStatus::Approved),
            "active" => Ok(BorrowStatus::Active),
            "returned" => Ok(BorrowStatus::Returned),
            "denied" => Ok(BorrowStatus::Denied),
            "cancelled" => Ok(BorrowStatus::Cancelled),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// A lifecycle transition, named after the action that drives it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowTransition {
    Approve,
    Deny,
    Cancel,
    ConfirmPickup,
    ConfirmReturn,
    Extend,
}

impl BorrowTransition {
    /// States from which this transition is legal
    pub fn valid_sources(&self) -> &'static [BorrowStatus] {
        match self {
            BorrowTransition::Approve | BorrowTransition::Deny => &[BorrowStatus::Requested],
            BorrowTransition::Cancel => &[BorrowStatus::Requested, BorrowStatus::Approved],
            BorrowTransition::ConfirmPickup => &[BorrowStatus::Approved],
            BorrowTransition::ConfirmReturn | BorrowTransition::Extend => &[BorrowStatus::Active],
        }
    }

    /// Status after a successful transition. `Extend` keeps the status.
    pub fn target(&self, current: BorrowStatus) -> BorrowStatus {
        match self {
            BorrowTransition::Approve => BorrowStatus::Approved,
            BorrowTransition::Deny => BorrowStatus::Denied,
            BorrowTransition::Cancel => BorrowStatus::Cancelled,
            BorrowTransition::ConfirmPickup => BorrowStatus::Active,
            BorrowTransition::ConfirmReturn => BorrowStatus::Returned,
            BorrowTransition::Extend => current,
        }
    }

    /// Guard a transition attempt, producing a state-conflict error when the
    /// current status is not a valid source. No mutation happens on failure.
    pub fn guard(&self, current: BorrowStatus) -> AppResult<BorrowStatus> {
        if self.valid_sources().contains(&current) {
            Ok(self.target(current))
        } else {
            Err(AppError::StateConflict(format!(
                "Cannot {:?} a borrow in state '{}'",
                self, current
            )))
        }
    }
}

/// The party an authenticated account plays on a given borrow, resolved
/// once at the handler boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowRole {
    Borrower,
    Lender,
    Admin,
}

impl BorrowRole {
    pub fn resolve(borrow: &Borrow, account_id: i32, is_admin: bool) -> AppResult<Self> {
        if borrow.borrower_id == account_id {
            Ok(BorrowRole::Borrower)
        } else if borrow.lender_id == account_id {
            Ok(BorrowRole::Lender)
        } else if is_admin {
            Ok(BorrowRole::Admin)
        } else {
            Err(AppError::Authorization(
                "Not a party to this borrow".to_string(),
            ))
        }
    }
}

/// Borrow model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub tool_id: i32,
    pub borrower_id: i32,
    pub lender_id: i32,
    pub status: BorrowStatus,
    pub requested_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_date: Option<DateTime<Utc>>,
    /// Fee/deposit snapshot taken from the tool at request time
    pub rental_fee: Decimal,
    pub deposit: Decimal,
    pub nb_extensions: i16,
}

/// Borrow with joined tool and counterparty summaries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowDetails {
    pub id: i32,
    pub status: BorrowStatus,
    pub tool_id: i32,
    pub tool_name: String,
    pub borrower: AccountShort,
    pub lender: AccountShort,
    pub requested_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_date: Option<DateTime<Utc>>,
    pub rental_fee: Decimal,
    pub deposit: Decimal,
    pub nb_extensions: i16,
    pub is_overdue: bool,
}

/// Borrow request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrow {
    pub tool_id: i32,
    /// Optional note to the lender
    #[validate(length(max = 500, message = "Message too long"))]
    pub message: Option<String>,
}

/// Borrow listing filter
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BorrowQuery {
    /// Restrict to borrows where the caller is this party
    pub role: Option<String>,
    pub status: Option<BorrowStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_and_deny_only_from_requested() {
        assert_eq!(
            BorrowTransition::Approve.guard(BorrowStatus::Requested).unwrap(),
            BorrowStatus::Approved
        );
        assert_eq!(
            BorrowTransition::Deny.guard(BorrowStatus::Requested).unwrap(),
            BorrowStatus::Denied
        );
        for status in [
            BorrowStatus::Approved,
            BorrowStatus::Active,
            BorrowStatus::Returned,
            BorrowStatus::Denied,
            BorrowStatus::Cancelled,
        ] {
            assert!(matches!(
                BorrowTransition::Approve.guard(status),
                Err(AppError::StateConflict(_))
            ));
        }
    }

    #[test]
    fn cancel_rejected_once_active() {
        assert!(BorrowTransition::Cancel.guard(BorrowStatus::Requested).is_ok());
        assert!(BorrowTransition::Cancel.guard(BorrowStatus::Approved).is_ok());
        assert!(matches!(
            BorrowTransition::Cancel.guard(BorrowStatus::Active),
            Err(AppError::StateConflict(_))
        ));
        assert!(BorrowTransition::Cancel.guard(BorrowStatus::Returned).is_err());
    }

    #[test]
    fn no_transition_leaves_a_terminal_state() {
        let transitions = [
            BorrowTransition::Approve,
            BorrowTransition::Deny,
            BorrowTransition::Cancel,
            BorrowTransition::ConfirmPickup,
            BorrowTransition::ConfirmReturn,
            BorrowTransition::Extend,
        ];
        for status in [BorrowStatus::Returned, BorrowStatus::Denied, BorrowStatus::Cancelled] {
            assert!(status.is_terminal());
            for t in transitions {
                assert!(t.guard(status).is_err(), "{:?} escaped terminal {:?}", t, status);
            }
        }
    }

    #[test]
    fn pickup_and_return_follow_the_happy_path() {
        let approved = BorrowTransition::Approve.guard(BorrowStatus::Requested).unwrap();
        let active = BorrowTransition::ConfirmPickup.guard(approved).unwrap();
        assert_eq!(active, BorrowStatus::Active);
        // Extension keeps the status
        assert_eq!(BorrowTransition::Extend.guard(active).unwrap(), BorrowStatus::Active);
        let returned = BorrowTransition::ConfirmReturn.guard(active).unwrap();
        assert_eq!(returned, BorrowStatus::Returned);
    }

    #[test]
    fn role_resolution_happens_once_per_borrow() {
        let borrow = Borrow {
            id: 1,
            tool_id: 1,
            borrower_id: 10,
            lender_id: 20,
            status: BorrowStatus::Requested,
            requested_date: Utc::now(),
            approved_date: None,
            due_date: None,
            returned_date: None,
            rental_fee: Decimal::ZERO,
            deposit: Decimal::ZERO,
            nb_extensions: 0,
        };
        assert_eq!(BorrowRole::resolve(&borrow, 10, false).unwrap(), BorrowRole::Borrower);
        assert_eq!(BorrowRole::resolve(&borrow, 20, false).unwrap(), BorrowRole::Lender);
        assert_eq!(BorrowRole::resolve(&borrow, 30, true).unwrap(), BorrowRole::Admin);
        assert!(BorrowRole::resolve(&borrow, 30, false).is_err());
    }

    #[test]
    fn status_parses_from_stored_text() {
        assert_eq!("active".parse::<BorrowStatus>().unwrap(), BorrowStatus::Active);
        assert!("pending".parse::<BorrowStatus>().is_err());
        assert_eq!(BorrowStatus::Cancelled.to_string(), "cancelled");
    }
}
