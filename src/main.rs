//! Toolshed Server - Neighborhood Tool-Sharing Marketplace
//!
//! A Rust REST API server for tool sharing between neighbors.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolshed_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("toolshed_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Toolshed Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.auth.clone(),
        config.lending.clone(),
        config.handover.clone(),
        config.rate_limits.clone(),
    )
    .expect("Failed to create services");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Coarse per-IP throttle on the credential endpoints, in front of the
    // application's own per-account rate-limit table
    let governor_conf = Box::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(50)
            .finish()
            .expect("Invalid governor configuration"),
    );
    let governor = GovernorLayer {
        config: Box::leak(governor_conf),
    };

    let auth_routes = Router::new()
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/password-reset", post(api::auth::request_password_reset))
        .route("/auth/password-reset/confirm", post(api::auth::confirm_password_reset))
        .layer(governor);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .merge(auth_routes)
        .route("/auth/me", get(api::auth::me))
        .route("/auth/profile", put(api::auth::update_profile))
        // Accounts
        .route("/accounts", get(api::accounts::list_accounts))
        .route("/accounts/:id", get(api::accounts::get_account))
        .route("/accounts/:id/status", put(api::accounts::update_account_status))
        .route("/accounts/:id/tools", get(api::accounts::list_account_tools))
        .route("/accounts/:id/ratings", get(api::ratings::list_account_ratings))
        // Tools
        .route("/tools", get(api::tools::list_tools))
        .route("/tools", post(api::tools::create_tool))
        .route("/tools/:id", get(api::tools::get_tool))
        .route("/tools/:id", put(api::tools::update_tool))
        .route("/tools/:id", delete(api::tools::delete_tool))
        // Borrows
        .route("/borrows", post(api::borrows::create_borrow))
        .route("/borrows", get(api::borrows::list_borrows))
        .route("/borrows/:id", get(api::borrows::get_borrow))
        .route("/borrows/:id/approve", post(api::borrows::approve_borrow))
        .route("/borrows/:id/deny", post(api::borrows::deny_borrow))
        .route("/borrows/:id/cancel", post(api::borrows::cancel_borrow))
        .route("/borrows/:id/extend", post(api::borrows::extend_borrow))
        // Handovers
        .route("/borrows/:id/handover/:kind/code", post(api::handovers::generate_code))
        .route("/borrows/:id/handover/:kind/verify", post(api::handovers::verify_code))
        // Waivers
        .route("/borrows/:id/waiver", post(api::waivers::sign_waiver))
        .route("/borrows/:id/waiver", get(api::waivers::get_waiver))
        // Ratings
        .route("/borrows/:id/rating", post(api::ratings::create_rating))
        // Disputes
        .route("/borrows/:id/dispute", post(api::disputes::open_dispute))
        .route("/disputes", get(api::disputes::list_disputes))
        .route("/disputes/:id", get(api::disputes::get_dispute))
        .route("/disputes/:id/messages", post(api::disputes::post_message))
        .route("/disputes/:id/resolve", post(api::disputes::resolve_dispute))
        // Notifications
        .route("/notifications", get(api::notifications::list_notifications))
        .route("/notifications/:id/read", post(api::notifications::mark_read))
        .route("/notifications/read-all", post(api::notifications::mark_all_read))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
