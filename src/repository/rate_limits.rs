//! Rate-limit attempts table: one row per attempt of a guarded action.
//!
//! An action is permitted iff fewer than `max_attempts` rows exist for
//! (action, subject) within the trailing window; the check and the
//! attempt record commit together.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    config::RateLimitRule,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct RateLimitsRepository {
    pool: Pool<Postgres>,
}

/// Seconds until the oldest in-window attempt ages out
pub(crate) fn retry_after(
    oldest_in_window: DateTime<Utc>,
    window_seconds: i64,
    now: DateTime<Utc>,
) -> i64 {
    let release = oldest_in_window + Duration::seconds(window_seconds);
    (release - now).num_seconds().max(1)
}

impl RateLimitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Check the rule for (action, subject) and record this attempt.
    /// Fails with a throttling error, recording nothing, when the window
    /// is full.
    pub async fn check_and_record(
        &self,
        action: &str,
        subject: &str,
        rule: RateLimitRule,
    ) -> AppResult<()> {
        let now = Utc::now();
        let window_start = now - Duration::seconds(rule.window_seconds);

        let mut tx = self.pool.begin().await?;

        // Opportunistic sweep of rows that aged out of the window
        sqlx::query("DELETE FROM rate_limit_attempts WHERE action = $1 AND subject = $2 AND attempted_at < $3")
            .bind(action)
            .bind(subject)
            .bind(window_start)
            .execute(&mut *tx)
            .await?;

        let oldest: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT MIN(attempted_at) FROM rate_limit_attempts
            WHERE action = $1 AND subject = $2 AND attempted_at >= $3
            "#,
        )
        .bind(action)
        .bind(subject)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rate_limit_attempts
            WHERE action = $1 AND subject = $2 AND attempted_at >= $3
            "#,
        )
        .bind(action)
        .bind(subject)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await?;

        if count >= rule.max_attempts {
            let retry_after_seconds = oldest
                .map(|o| retry_after(o, rule.window_seconds, now))
                .unwrap_or(rule.window_seconds);
            return Err(AppError::RateLimited { retry_after_seconds });
        }

        sqlx::query(
            "INSERT INTO rate_limit_attempts (action, subject, attempted_at) VALUES ($1, $2, $3)",
        )
        .bind(action)
        .bind(subject)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_counts_down_to_window_release() {
        let now = Utc::now();
        let oldest = now - Duration::seconds(100);
        // 900s window opened 100s ago: 800s remain
        assert_eq!(retry_after(oldest, 900, now), 800);
    }

    #[test]
    fn retry_after_never_reports_zero() {
        let now = Utc::now();
        let oldest = now - Duration::seconds(900);
        assert_eq!(retry_after(oldest, 900, now), 1);
    }
}
