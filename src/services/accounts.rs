//! Account and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::account::{
        Account, AccountClaims, AccountQuery, AccountStatus, RegisterAccount, UpdateProfile,
    },
    repository::Repository,
    services::rate_limit::RateLimitService,
};

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    config: AuthConfig,
    rate_limit: RateLimitService,
}

impl AccountsService {
    pub fn new(repository: Repository, config: AuthConfig, rate_limit: RateLimitService) -> Self {
        Self { repository, config, rate_limit }
    }

    /// Register a new account. Throttled per submitted login.
    pub async fn register(&self, request: RegisterAccount) -> AppResult<Account> {
        self.rate_limit
            .enforce("register", &request.login.to_lowercase())
            .await?;

        if self.repository.accounts.login_exists(&request.login, None).await? {
            return Err(AppError::Conflict("Login already exists".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;
        self.repository.accounts.create(&request, &password_hash).await
    }

    /// Authenticate by login and issue a JWT. Throttled per login.
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, Account)> {
        self.rate_limit.enforce("login", &login.to_lowercase()).await?;

        let account = self
            .repository
            .accounts
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        match account.status_enum() {
            AccountStatus::Blocked => {
                return Err(AppError::Authentication("Account is blocked".to_string()));
            }
            AccountStatus::Deleted => {
                return Err(AppError::Authentication("Invalid login or password".to_string()));
            }
            AccountStatus::Active => {}
        }

        if !self.verify_password(&account, password)? {
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let token = self.create_token(&account)?;
        Ok((token, account))
    }

    /// Create JWT token for an account
    fn create_token(&self, account: &Account) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = AccountClaims {
            sub: account.login.clone(),
            account_id: account.id,
            account_type: account.account_type,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, account: &Account, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&account.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Get account by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Account> {
        self.repository.accounts.get_by_id(id).await
    }

    /// Update own profile; changing the password requires the current one
    pub async fn update_profile(&self, account_id: i32, profile: UpdateProfile) -> AppResult<Account> {
        let account = self.repository.accounts.get_by_id(account_id).await?;

        if profile.new_password.is_some() {
            let current_password = profile.current_password.as_ref().ok_or_else(|| {
                AppError::Validation("Current password required to change password".to_string())
            })?;

            if !self.verify_password(&account, current_password)? {
                return Err(AppError::Authentication("Current password is incorrect".to_string()));
            }
        }

        let password_hash = if let Some(ref new_password) = profile.new_password {
            Some(self.hash_password(new_password)?)
        } else {
            None
        };

        self.repository
            .accounts
            .update_profile(account_id, &profile, password_hash)
            .await
    }

    /// Start a password reset for the account behind an email. Throttled
    /// per email. The token is persisted; its delivery is out of band.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> AppResult<Option<(Uuid, DateTime<Utc>)>> {
        self.rate_limit
            .enforce("password_reset", &email.to_lowercase())
            .await?;

        // A missing email is not revealed to the caller
        let Some(account) = self.repository.accounts.get_by_email(email).await? else {
            return Ok(None);
        };

        if account.status_enum() != AccountStatus::Active {
            return Ok(None);
        }

        let issued = self
            .repository
            .accounts
            .create_reset_token(account.id, self.config.reset_token_minutes)
            .await?;
        Ok(Some(issued))
    }

    /// Consume a reset token and set the new password
    pub async fn confirm_password_reset(&self, token: Uuid, new_password: &str) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let account_id = self.repository.accounts.consume_reset_token(token).await?;
        let hash = self.hash_password(new_password)?;
        self.repository.accounts.set_password(account_id, &hash).await
    }

    /// Search accounts (admin)
    pub async fn search(&self, query: &AccountQuery) -> AppResult<(Vec<Account>, i64)> {
        self.repository.accounts.search(query).await
    }

    /// Update account status (admin)
    pub async fn update_status(&self, id: i32, status: AccountStatus) -> AppResult<Account> {
        self.repository.accounts.update_status(id, status).await
    }
}
