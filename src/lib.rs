//! Toolshed Tool-Sharing Marketplace
//!
//! A Rust implementation of the Toolshed neighborhood tool-sharing server,
//! providing a REST JSON API for tool listings, borrow transactions,
//! handover verification, waivers, ratings and disputes.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
