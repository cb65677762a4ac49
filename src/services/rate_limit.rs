//! Rate-limit enforcement service
//!
//! Sensitive actions (login, register, borrow requests, password resets)
//! are capped per subject within a rolling window. Rules come from the
//! configuration table; an unlisted action is unthrottled.

use crate::{config::RateLimitConfig, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct RateLimitService {
    repository: Repository,
    config: RateLimitConfig,
}

impl RateLimitService {
    pub fn new(repository: Repository, config: RateLimitConfig) -> Self {
        Self { repository, config }
    }

    /// Enforce the configured rule for (action, subject), recording the
    /// attempt when permitted. The subject is the account id when known,
    /// otherwise the caller-supplied identity (login, email).
    pub async fn enforce(&self, action: &str, subject: &str) -> AppResult<()> {
        let Some(rule) = self.config.rule(action) else {
            return Ok(());
        };

        self.repository
            .rate_limits
            .check_and_record(action, subject, rule)
            .await
    }
}
