//! Account management endpoints (admin) and public profile data

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        account::{Account, AccountQuery, UpdateAccountStatus},
        tool::Tool,
    },
};

use super::AuthenticatedAccount;

/// Paginated account listing
#[derive(Serialize, ToSchema)]
pub struct AccountList {
    pub accounts: Vec<Account>,
    pub total: i64,
}

/// List accounts (admin)
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(AccountQuery),
    responses(
        (status = 200, description = "Accounts", body = AccountList),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_accounts(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Query(query): Query<AccountQuery>,
) -> AppResult<Json<AccountList>> {
    claims.require_admin()?;

    let (accounts, total) = state.services.accounts.search(&query).await?;
    Ok(Json(AccountList { accounts, total }))
}

/// Get one account (admin)
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = Account),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_account(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<Account>> {
    claims.require_admin()?;

    let account = state.services.accounts.get_by_id(id).await?;
    Ok(Json(account))
}

/// Block or unblock an account (admin)
#[utoipa::path(
    put,
    path = "/accounts/{id}/status",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Account ID")),
    request_body = UpdateAccountStatus,
    responses(
        (status = 200, description = "Status updated", body = Account),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_account_status(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAccountStatus>,
) -> AppResult<Json<Account>> {
    claims.require_admin()?;

    let account = state.services.accounts.update_status(id, request.status).await?;
    Ok(Json(account))
}

/// Tools owned by an account
#[utoipa::path(
    get,
    path = "/accounts/{id}/tools",
    tag = "accounts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account's tools", body = Vec<Tool>),
        (status = 404, description = "Account not found")
    )
)]
pub async fn list_account_tools(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(_claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Tool>>> {
    let tools = state.services.tools.list_by_owner(id).await?;
    Ok(Json(tools))
}
