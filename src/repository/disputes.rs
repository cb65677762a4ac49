//! Disputes repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::dispute::{
        Dispute, DisputeDetails, DisputeMessage, DisputeQuery, DisputeStatus, OpenDispute,
    },
};

#[derive(Clone)]
pub struct DisputesRepository {
    pool: Pool<Postgres>,
}

impl DisputesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get dispute by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Dispute> {
        sqlx::query_as::<_, Dispute>("SELECT * FROM disputes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dispute with id {} not found", id)))
    }

    /// Dispute with its message thread
    pub async fn get_details(&self, id: i32) -> AppResult<DisputeDetails> {
        let dispute = self.get_by_id(id).await?;
        let messages = sqlx::query_as::<_, DisputeMessage>(
            "SELECT * FROM dispute_messages WHERE dispute_id = $1 ORDER BY created_date",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(DisputeDetails { dispute, messages })
    }

    /// Open a dispute with its first message. One dispute per borrow.
    pub async fn create(
        &self,
        borrow_id: i32,
        opened_by: i32,
        request: &OpenDispute,
    ) -> AppResult<Dispute> {
        let mut tx = self.pool.begin().await?;

        let dispute = sqlx::query_as::<_, Dispute>(
            r#"
            INSERT INTO disputes (borrow_id, opened_by, subject, status, opened_date)
            VALUES ($1, $2, $3, 'open', $4)
            ON CONFLICT (borrow_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(borrow_id)
        .bind(opened_by)
        .bind(&request.subject)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("A dispute already exists for this borrow".to_string())
        })?;

        sqlx::query(
            r#"
            INSERT INTO dispute_messages (dispute_id, author_id, body, created_date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(dispute.id)
        .bind(opened_by)
        .bind(&request.body)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(dispute)
    }

    /// Append a message to an open dispute
    pub async fn add_message(
        &self,
        dispute_id: i32,
        author_id: i32,
        body: &str,
    ) -> AppResult<DisputeMessage> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM disputes WHERE id = $1 FOR UPDATE")
            .bind(dispute_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dispute with id {} not found", dispute_id)))?;

        let status: DisputeStatus = row.get("status");
        if status == DisputeStatus::Resolved {
            return Err(AppError::StateConflict(
                "Dispute is resolved, the thread is closed".to_string(),
            ));
        }

        let message = sqlx::query_as::<_, DisputeMessage>(
            r#"
            INSERT INTO dispute_messages (dispute_id, author_id, body, created_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(dispute_id)
        .bind(author_id)
        .bind(body)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(message)
    }

    /// Resolve an open dispute (admin). Resolution is terminal.
    pub async fn resolve(&self, dispute_id: i32, resolution_note: &str) -> AppResult<Dispute> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM disputes WHERE id = $1 FOR UPDATE")
            .bind(dispute_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dispute with id {} not found", dispute_id)))?;

        let status: DisputeStatus = row.get("status");
        if status == DisputeStatus::Resolved {
            return Err(AppError::StateConflict("Dispute already resolved".to_string()));
        }

        let dispute = sqlx::query_as::<_, Dispute>(
            r#"
            UPDATE disputes SET status = 'resolved', resolution_note = $2, resolved_date = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(dispute_id)
        .bind(resolution_note)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(dispute)
    }

    /// List disputes (admin), optionally by status
    pub async fn list(&self, query: &DisputeQuery) -> AppResult<(Vec<Dispute>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let status = query.status.map(|s| s.as_str().to_string());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM disputes WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(&status)
        .fetch_one(&self.pool)
        .await?;

        let disputes = sqlx::query_as::<_, Dispute>(
            r#"
            SELECT * FROM disputes
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY opened_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&status)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((disputes, total))
    }
}
