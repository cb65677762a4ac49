//! Account model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Account type slug (string identifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Member,
    Admin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Member => "member",
            AccountType::Admin => "admin",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(AccountType::Member),
            "admin" => Ok(AccountType::Admin),
            _ => Err(format!("Invalid account type: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for AccountType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for AccountType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for AccountType {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum AccountStatus {
    Active = 0,
    Blocked = 1,
    Deleted = 2,
}

impl From<i16> for AccountStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => AccountStatus::Blocked,
            2 => AccountStatus::Deleted,
            _ => AccountStatus::Active,
        }
    }
}

impl From<Option<i16>> for AccountStatus {
    fn from(v: Option<i16>) -> Self {
        v.map(AccountStatus::from).unwrap_or(AccountStatus::Active)
    }
}

/// Full account model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Account {
    pub id: i32,
    pub login: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub addr_street: Option<String>,
    pub addr_city: Option<String>,
    pub account_type: AccountType,
    pub status: i16,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl Account {
    pub fn status_enum(&self) -> AccountStatus {
        AccountStatus::from(self.status)
    }
}

/// Short account representation embedded in borrow/rating payloads
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AccountShort {
    pub id: i32,
    pub display_name: Option<String>,
    /// Average rating received, when any ratings exist
    pub avg_rating: Option<f64>,
    pub nb_ratings: Option<i64>,
}

/// Account query parameters (admin listing)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AccountQuery {
    pub name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Register request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterAccount {
    #[validate(length(min = 3, message = "Login must be at least 3 characters"))]
    pub login: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub display_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub addr_street: Option<String>,
    pub addr_city: Option<String>,
}

/// Update own profile request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub addr_street: Option<String>,
    pub addr_city: Option<String>,
    /// Current password (required to change password)
    pub current_password: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: Option<String>,
}

/// Update account status request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccountStatus {
    pub status: AccountStatus,
}

/// JWT claims for authenticated accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountClaims {
    pub sub: String,
    pub account_id: i32,
    pub account_type: AccountType,
    pub exp: i64,
    pub iat: i64,
}

impl AccountClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.account_type == AccountType::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_round_trips_through_slug() {
        assert_eq!("member".parse::<AccountType>().unwrap(), AccountType::Member);
        assert_eq!("ADMIN".parse::<AccountType>().unwrap(), AccountType::Admin);
        assert!("owner".parse::<AccountType>().is_err());
        assert_eq!(AccountType::Member.to_string(), "member");
    }

    #[test]
    fn blocked_and_deleted_statuses_decode() {
        assert_eq!(AccountStatus::from(1), AccountStatus::Blocked);
        assert_eq!(AccountStatus::from(2), AccountStatus::Deleted);
        assert_eq!(AccountStatus::from(0), AccountStatus::Active);
        assert_eq!(AccountStatus::from(None), AccountStatus::Active);
    }

    #[test]
    fn claims_token_round_trip() {
        let claims = AccountClaims {
            sub: "alice".to_string(),
            account_id: 7,
            account_type: AccountType::Member,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = claims.create_token("test-secret").unwrap();
        let parsed = AccountClaims::from_token(&token, "test-secret").unwrap();
        assert_eq!(parsed.account_id, 7);
        assert!(!parsed.is_admin());
        assert!(parsed.require_admin().is_err());
    }
}
