//! Accounts repository for database operations

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::account::{Account, AccountQuery, AccountStatus, RegisterAccount, UpdateProfile},
};

#[derive(Clone)]
pub struct AccountsRepository {
    pool: Pool<Postgres>,
}

impl AccountsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get account by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Account> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account with id {} not found", id)))
    }

    /// Get account by login
    pub async fn get_by_login(&self, login: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    /// Get account by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    /// Check whether a login is taken, optionally excluding an account
    pub async fn login_exists(&self, login: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE login = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(login)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new account with an already-hashed password
    pub async fn create(&self, account: &RegisterAccount, password_hash: &str) -> AppResult<Account> {
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (login, password, display_name, email, phone, addr_street, addr_city, account_type, status, crea_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'member', 0, $8)
            RETURNING *
            "#,
        )
        .bind(&account.login)
        .bind(password_hash)
        .bind(&account.display_name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.addr_street)
        .bind(&account.addr_city)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update an account's own profile fields
    pub async fn update_profile(
        &self,
        id: i32,
        profile: &UpdateProfile,
        password_hash: Option<String>,
    ) -> AppResult<Account> {
        let updated = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                display_name = COALESCE($2, display_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                addr_street = COALESCE($5, addr_street),
                addr_city = COALESCE($6, addr_city),
                password = COALESCE($7, password),
                modif_date = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile.display_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.addr_street)
        .bind(&profile.addr_city)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Account with id {} not found", id)))
    }

    /// Update account status (admin)
    pub async fn update_status(&self, id: i32, status: AccountStatus) -> AppResult<Account> {
        let updated = sqlx::query_as::<_, Account>(
            "UPDATE accounts SET status = $2, modif_date = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status as i16)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Account with id {} not found", id)))
    }

    /// Set a new password hash directly (password reset flow)
    pub async fn set_password(&self, id: i32, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE accounts SET password = $2, modif_date = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Account with id {} not found", id)));
        }
        Ok(())
    }

    /// Search accounts (admin listing)
    pub async fn search(&self, query: &AccountQuery) -> AppResult<(Vec<Account>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let pattern = query.name.as_ref().map(|n| format!("%{}%", n.to_lowercase()));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM accounts
            WHERE status != 2
              AND ($1::text IS NULL OR LOWER(display_name) LIKE $1 OR LOWER(login) LIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT * FROM accounts
            WHERE status != 2
              AND ($1::text IS NULL OR LOWER(display_name) LIKE $1 OR LOWER(login) LIKE $1)
            ORDER BY login
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((accounts, total))
    }

    /// Record a password reset token for an account
    pub async fn create_reset_token(
        &self,
        account_id: i32,
        lifetime_minutes: i64,
    ) -> AppResult<(Uuid, DateTime<Utc>)> {
        let token = Uuid::new_v4();
        let expiry = Utc::now() + Duration::minutes(lifetime_minutes);

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token, account_id, expiry_date, created_date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token)
        .bind(account_id)
        .bind(expiry)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok((token, expiry))
    }

    /// Consume a reset token: single-use, expiring. Returns the account id.
    pub async fn consume_reset_token(&self, token: Uuid) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT account_id, expiry_date, used FROM password_reset_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown reset token".to_string()))?;

        let used: bool = row.get("used");
        let expiry: DateTime<Utc> = row.get("expiry_date");
        if used {
            return Err(AppError::Validation("Reset token already used".to_string()));
        }
        if Utc::now() >= expiry {
            return Err(AppError::ExpiredCode("Reset token expired".to_string()));
        }

        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.get("account_id"))
    }
}
