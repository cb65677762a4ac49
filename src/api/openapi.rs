//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, auth, borrows, disputes, handovers, health, notifications, ratings, tools, waivers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Toolshed API",
        version = "1.0.0",
        description = "Neighborhood Tool-Sharing Marketplace REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Toolshed Team", email = "contact@toolshed.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        auth::request_password_reset,
        auth::confirm_password_reset,
        // Accounts
        accounts::list_accounts,
        accounts::get_account,
        accounts::update_account_status,
        accounts::list_account_tools,
        // Tools
        tools::list_tools,
        tools::get_tool,
        tools::create_tool,
        tools::update_tool,
        tools::delete_tool,
        // Borrows
        borrows::create_borrow,
        borrows::list_borrows,
        borrows::get_borrow,
        borrows::approve_borrow,
        borrows::deny_borrow,
        borrows::cancel_borrow,
        borrows::extend_borrow,
        // Handovers
        handovers::generate_code,
        handovers::verify_code,
        // Waivers
        waivers::sign_waiver,
        waivers::get_waiver,
        // Ratings
        ratings::create_rating,
        ratings::list_account_ratings,
        // Disputes
        disputes::open_dispute,
        disputes::get_dispute,
        disputes::post_message,
        disputes::resolve_dispute,
        disputes::list_disputes,
        // Notifications
        notifications::list_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::PasswordResetRequest,
            auth::PasswordResetResponse,
            auth::PasswordResetConfirm,
            // Accounts
            crate::models::account::Account,
            crate::models::account::AccountShort,
            crate::models::account::AccountType,
            crate::models::account::AccountStatus,
            crate::models::account::RegisterAccount,
            crate::models::account::UpdateProfile,
            crate::models::account::UpdateAccountStatus,
            accounts::AccountList,
            // Tools
            crate::models::tool::Tool,
            crate::models::tool::ToolDetails,
            crate::models::tool::ToolPage,
            crate::models::tool::CreateTool,
            crate::models::tool::UpdateTool,
            // Borrows
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::BorrowStatus,
            crate::models::borrow::CreateBorrow,
            borrows::ApprovalResponse,
            borrows::BorrowResponse,
            // Handovers
            crate::models::handover::HandoverCode,
            crate::models::handover::HandoverCodeIssued,
            crate::models::handover::HandoverKind,
            crate::models::handover::VerifyHandover,
            handovers::HandoverVerified,
            // Waivers
            crate::models::waiver::Waiver,
            crate::models::waiver::SignWaiver,
            // Ratings
            crate::models::rating::Rating,
            crate::models::rating::CreateRating,
            crate::models::rating::RatingSummary,
            // Disputes
            crate::models::dispute::Dispute,
            crate::models::dispute::DisputeDetails,
            crate::models::dispute::DisputeMessage,
            crate::models::dispute::DisputeStatus,
            crate::models::dispute::OpenDispute,
            crate::models::dispute::PostDisputeMessage,
            crate::models::dispute::ResolveDispute,
            disputes::DisputeList,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationKind,
            notifications::MarkAllReadResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "accounts", description = "Account management"),
        (name = "tools", description = "Tool listings"),
        (name = "borrows", description = "Borrow lifecycle"),
        (name = "handovers", description = "Handover code exchange"),
        (name = "waivers", description = "Liability waivers"),
        (name = "ratings", description = "Counterparty ratings"),
        (name = "disputes", description = "Dispute escalation"),
        (name = "notifications", description = "In-app notifications")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
