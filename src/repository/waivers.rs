//! Waivers repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::waiver::{SignWaiver, Waiver},
};

#[derive(Clone)]
pub struct WaiversRepository {
    pool: Pool<Postgres>,
}

impl WaiversRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Waiver on file for a borrow, if any
    pub async fn get_by_borrow(&self, borrow_id: i32) -> AppResult<Option<Waiver>> {
        let waiver = sqlx::query_as::<_, Waiver>("SELECT * FROM waivers WHERE borrow_id = $1")
            .bind(borrow_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(waiver)
    }

    pub async fn exists_for_borrow(&self, borrow_id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM waivers WHERE borrow_id = $1)")
                .bind(borrow_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Record a signed waiver. At most one per borrow; the unique index
    /// turns a duplicate insert into a conflict.
    pub async fn create(
        &self,
        borrow_id: i32,
        borrower_id: i32,
        waiver: &SignWaiver,
    ) -> AppResult<Waiver> {
        let created = sqlx::query_as::<_, Waiver>(
            r#"
            INSERT INTO waivers (borrow_id, borrower_id, acknowledgment, condition_ack, signed_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (borrow_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(borrow_id)
        .bind(borrower_id)
        .bind(&waiver.acknowledgment)
        .bind(waiver.condition_ack)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| {
            AppError::Conflict("A waiver is already on file for this borrow".to_string())
        })
    }
}
