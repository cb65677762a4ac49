//! Tool listing service

use crate::{
    error::{AppError, AppResult},
    models::tool::{CreateTool, Tool, ToolDetails, ToolQuery, UpdateTool},
    repository::Repository,
};

#[derive(Clone)]
pub struct ToolsService {
    repository: Repository,
}

impl ToolsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search listed tools
    pub async fn search(&self, query: &ToolQuery) -> AppResult<(Vec<ToolDetails>, i64)> {
        self.repository.tools.search(query).await
    }

    /// Get one tool with derived availability
    pub async fn get(&self, id: i32) -> AppResult<ToolDetails> {
        let tool = self.repository.tools.get_by_id(id).await?;
        let available = !self.repository.tools.has_open_borrow(id).await?;
        Ok(ToolDetails { tool, available })
    }

    /// Tools owned by an account
    pub async fn list_by_owner(&self, owner_id: i32) -> AppResult<Vec<Tool>> {
        // Verify owner exists
        self.repository.accounts.get_by_id(owner_id).await?;
        self.repository.tools.list_by_owner(owner_id).await
    }

    /// Create a listing owned by the caller
    pub async fn create(&self, owner_id: i32, tool: CreateTool) -> AppResult<Tool> {
        self.repository.tools.create(owner_id, &tool).await
    }

    /// Update a listing; owner only
    pub async fn update(&self, id: i32, acting_account: i32, tool: UpdateTool) -> AppResult<Tool> {
        let existing = self.repository.tools.get_by_id(id).await?;
        if existing.owner_id != acting_account {
            return Err(AppError::Authorization(
                "Only the owner may update a tool".to_string(),
            ));
        }
        self.repository.tools.update(id, &tool).await
    }

    /// Delete a listing; owner only, refused while a borrow is open
    pub async fn delete(&self, id: i32, acting_account: i32, is_admin: bool) -> AppResult<()> {
        let existing = self.repository.tools.get_by_id(id).await?;
        if existing.owner_id != acting_account && !is_admin {
            return Err(AppError::Authorization(
                "Only the owner may delete a tool".to_string(),
            ));
        }
        self.repository.tools.delete(id).await
    }
}
