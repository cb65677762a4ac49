//! Tool listing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::tool::{CreateTool, Tool, ToolDetails, ToolPage, ToolQuery, UpdateTool},
};

use super::AuthenticatedAccount;

/// Search listed tools
#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    params(ToolQuery),
    responses(
        (status = 200, description = "Tool listing", body = ToolPage)
    )
)]
pub async fn list_tools(
    State(state): State<crate::AppState>,
    Query(query): Query<ToolQuery>,
) -> AppResult<Json<ToolPage>> {
    let (tools, total) = state.services.tools.search(&query).await?;

    Ok(Json(ToolPage {
        tools,
        total,
        page: query.page.unwrap_or(1).max(1),
        per_page: query.per_page.unwrap_or(20).clamp(1, 100),
    }))
}

/// Get one tool with availability
#[utoipa::path(
    get,
    path = "/tools/{id}",
    tag = "tools",
    params(("id" = i32, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool", body = ToolDetails),
        (status = 404, description = "Tool not found")
    )
)]
pub async fn get_tool(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ToolDetails>> {
    let tool = state.services.tools.get(id).await?;
    Ok(Json(tool))
}

/// Create a tool listing
#[utoipa::path(
    post,
    path = "/tools",
    tag = "tools",
    security(("bearer_auth" = [])),
    request_body = CreateTool,
    responses(
        (status = 201, description = "Tool created", body = Tool),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_tool(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Json(request): Json<CreateTool>,
) -> AppResult<(StatusCode, Json<Tool>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tool = state.services.tools.create(claims.account_id, request).await?;
    Ok((StatusCode::CREATED, Json(tool)))
}

/// Update a tool listing (owner only)
#[utoipa::path(
    put,
    path = "/tools/{id}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tool ID")),
    request_body = UpdateTool,
    responses(
        (status = 200, description = "Tool updated", body = Tool),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Tool not found")
    )
)]
pub async fn update_tool(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
    Json(request): Json<UpdateTool>,
) -> AppResult<Json<Tool>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tool = state
        .services
        .tools
        .update(id, claims.account_id, request)
        .await?;
    Ok(Json(tool))
}

/// Delete a tool listing (owner only, refused while a borrow is open)
#[utoipa::path(
    delete,
    path = "/tools/{id}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tool ID")),
    responses(
        (status = 204, description = "Tool deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Tool not found"),
        (status = 409, description = "Tool has an open borrow")
    )
)]
pub async fn delete_tool(
    State(state): State<crate::AppState>,
    AuthenticatedAccount(claims): AuthenticatedAccount,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .tools
        .delete(id, claims.account_id, claims.is_admin())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
