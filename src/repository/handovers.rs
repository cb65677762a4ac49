//! Handover codes repository. Verification and the resulting borrow
//! status change commit in one transaction.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{Borrow, BorrowStatus, BorrowTransition},
        handover::{HandoverCode, HandoverKind, CODE_ALPHABET},
    },
};

#[derive(Clone)]
pub struct HandoversRepository {
    pool: Pool<Postgres>,
}

/// Generate a random code from the unambiguous alphabet
fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

impl HandoversRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Currently active code for (borrow, kind), if any
    pub async fn get_active(
        &self,
        borrow_id: i32,
        kind: HandoverKind,
    ) -> AppResult<Option<HandoverCode>> {
        let code = sqlx::query_as::<_, HandoverCode>(
            r#"
            SELECT * FROM handover_codes
            WHERE borrow_id = $1 AND kind = $2
              AND verified_date IS NULL AND NOT superseded AND expiry_date > NOW()
            ORDER BY created_date DESC
            LIMIT 1
            "#,
        )
        .bind(borrow_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(code)
    }

    /// Issue a fresh code for (borrow, kind). Any previous code for the
    /// pair is superseded so exactly one code can ever verify.
    pub async fn issue(
        &self,
        borrow_id: i32,
        kind: HandoverKind,
        code_length: usize,
        expiry_minutes: i64,
    ) -> AppResult<HandoverCode> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE handover_codes SET superseded = TRUE
            WHERE borrow_id = $1 AND kind = $2 AND verified_date IS NULL AND NOT superseded
            "#,
        )
        .bind(borrow_id)
        .bind(kind)
        .execute(&mut *tx)
        .await?;

        let now = Utc::now();
        let code = sqlx::query_as::<_, HandoverCode>(
            r#"
            INSERT INTO handover_codes (borrow_id, kind, code, expiry_date, created_date, superseded)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING *
            "#,
        )
        .bind(borrow_id)
        .bind(kind)
        .bind(generate_code(code_length))
        .bind(now + Duration::minutes(expiry_minutes))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(code)
    }

    /// Verify a submitted code and apply the resulting lifecycle
    /// transition (pickup: approved -> active, return: active -> returned)
    /// atomically. The borrow row lock serializes races with cancel.
    pub async fn verify(
        &self,
        borrow_id: i32,
        kind: HandoverKind,
        submitted: &str,
        condition_notes: Option<&str>,
    ) -> AppResult<Borrow> {
        let transition = match kind {
            HandoverKind::Pickup => BorrowTransition::ConfirmPickup,
            HandoverKind::Return => BorrowTransition::ConfirmReturn,
        };

        let mut tx = self.pool.begin().await?;

        let current = crate::repository::borrows::BorrowsRepository::lock_status(&mut tx, borrow_id).await?;
        let target = transition.guard(current)?;

        let code_row = sqlx::query(
            r#"
            SELECT id, code, expiry_date FROM handover_codes
            WHERE borrow_id = $1 AND kind = $2
              AND verified_date IS NULL AND NOT superseded
            ORDER BY created_date DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(borrow_id)
        .bind(kind)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::ExpiredCode(format!(
                "No active {} code for this borrow, generate a new one",
                kind
            ))
        })?;

        let expiry: DateTime<Utc> = code_row.get("expiry_date");
        if Utc::now() >= expiry {
            // Deterministic wall-clock deadline, regardless of attempts
            return Err(AppError::ExpiredCode(format!(
                "The {} code has expired, generate a new one",
                kind
            )));
        }

        let stored: String = code_row.get("code");
        if stored != submitted.trim().to_uppercase() {
            // Failed attempts never consume the code
            return Err(AppError::Validation("Incorrect handover code".to_string()));
        }

        let code_id: i32 = code_row.get("id");
        let now = Utc::now();

        sqlx::query(
            "UPDATE handover_codes SET verified_date = $2, condition_notes = $3 WHERE id = $1",
        )
        .bind(code_id)
        .bind(now)
        .bind(condition_notes)
        .execute(&mut *tx)
        .await?;

        let returned_date = match target {
            BorrowStatus::Returned => Some(now),
            _ => None,
        };

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows SET status = $2, returned_date = COALESCE($3, returned_date)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(borrow_id)
        .bind(target)
        .bind(returned_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(borrow)
    }
}
