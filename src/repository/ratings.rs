//! Ratings repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::rating::{CreateRating, Rating, RatingSummary},
};

#[derive(Clone)]
pub struct RatingsRepository {
    pool: Pool<Postgres>,
}

impl RatingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a rating. One per (borrow, rater); the unique index turns a
    /// duplicate insert into a conflict.
    pub async fn create(
        &self,
        borrow_id: i32,
        rater_id: i32,
        ratee_id: i32,
        rating: &CreateRating,
    ) -> AppResult<Rating> {
        let created = sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings (borrow_id, rater_id, ratee_id, score, comment, created_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (borrow_id, rater_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(borrow_id)
        .bind(rater_id)
        .bind(ratee_id)
        .bind(rating.score)
        .bind(&rating.comment)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| {
            AppError::Conflict("You have already rated this borrow".to_string())
        })
    }

    /// Ratings received by an account, with aggregates
    pub async fn summary_for_account(&self, account_id: i32) -> AppResult<RatingSummary> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE ratee_id = $1 ORDER BY created_date DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let nb_ratings = ratings.len() as i64;
        let avg_score = if nb_ratings > 0 {
            Some(ratings.iter().map(|r| r.score as f64).sum::<f64>() / nb_ratings as f64)
        } else {
            None
        };

        Ok(RatingSummary {
            account_id,
            avg_score,
            nb_ratings,
            ratings,
        })
    }
}
