//! Business logic services

pub mod accounts;
pub mod borrows;
pub mod disputes;
pub mod handovers;
pub mod notifications;
pub mod rate_limit;
pub mod ratings;
pub mod tools;
pub mod waivers;

use crate::{
    config::{AuthConfig, HandoverConfig, LendingConfig, RateLimitConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub tools: tools::ToolsService,
    pub borrows: borrows::BorrowsService,
    pub handovers: handovers::HandoversService,
    pub waivers: waivers::WaiversService,
    pub ratings: ratings::RatingsService,
    pub disputes: disputes::DisputesService,
    pub notifications: notifications::NotificationsService,
    pub rate_limit: rate_limit::RateLimitService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        lending_config: LendingConfig,
        handover_config: HandoverConfig,
        rate_limit_config: RateLimitConfig,
    ) -> AppResult<Self> {
        let rate_limit =
            rate_limit::RateLimitService::new(repository.clone(), rate_limit_config);

        Ok(Self {
            accounts: accounts::AccountsService::new(
                repository.clone(),
                auth_config,
                rate_limit.clone(),
            ),
            tools: tools::ToolsService::new(repository.clone()),
            borrows: borrows::BorrowsService::new(
                repository.clone(),
                lending_config,
                handover_config.clone(),
                rate_limit.clone(),
            ),
            handovers: handovers::HandoversService::new(repository.clone(), handover_config),
            waivers: waivers::WaiversService::new(repository.clone()),
            ratings: ratings::RatingsService::new(repository.clone()),
            disputes: disputes::DisputesService::new(repository.clone()),
            notifications: notifications::NotificationsService::new(repository),
            rate_limit,
        })
    }
}
