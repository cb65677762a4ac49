//! Repository layer for database operations

pub mod accounts;
pub mod borrows;
pub mod disputes;
pub mod handovers;
pub mod notifications;
pub mod rate_limits;
pub mod ratings;
pub mod tools;
pub mod waivers;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub accounts: accounts::AccountsRepository,
    pub tools: tools::ToolsRepository,
    pub borrows: borrows::BorrowsRepository,
    pub handovers: handovers::HandoversRepository,
    pub waivers: waivers::WaiversRepository,
    pub ratings: ratings::RatingsRepository,
    pub disputes: disputes::DisputesRepository,
    pub notifications: notifications::NotificationsRepository,
    pub rate_limits: rate_limits::RateLimitsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            accounts: accounts::AccountsRepository::new(pool.clone()),
            tools: tools::ToolsRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            handovers: handovers::HandoversRepository::new(pool.clone()),
            waivers: waivers::WaiversRepository::new(pool.clone()),
            ratings: ratings::RatingsRepository::new(pool.clone()),
            disputes: disputes::DisputesRepository::new(pool.clone()),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            rate_limits: rate_limits::RateLimitsRepository::new(pool.clone()),
            pool,
        }
    }
}
