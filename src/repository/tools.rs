//! Tools repository for database operations

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::tool::{CreateTool, Tool, ToolDetails, ToolQuery, UpdateTool},
};

#[derive(Clone)]
pub struct ToolsRepository {
    pool: Pool<Postgres>,
}

impl ToolsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get tool by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Tool> {
        sqlx::query_as::<_, Tool>("SELECT * FROM tools WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tool with id {} not found", id)))
    }

    /// Whether any non-terminal borrow currently holds the tool
    pub async fn has_open_borrow(&self, tool_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrows
                WHERE tool_id = $1
                  AND status NOT IN ('returned', 'denied', 'cancelled')
            )
            "#,
        )
        .bind(tool_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Search listed tools with derived availability
    pub async fn search(&self, query: &ToolQuery) -> AppResult<(Vec<ToolDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let name_pattern = query.name.as_ref().map(|n| format!("%{}%", n.to_lowercase()));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tools t
            WHERE t.listed
              AND ($1::text IS NULL OR LOWER(t.name) LIKE $1)
              AND ($2::text IS NULL OR t.category = $2)
            "#,
        )
        .bind(&name_pattern)
        .bind(&query.category)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT t.*,
                   NOT EXISTS(
                       SELECT 1 FROM borrows b
                       WHERE b.tool_id = t.id
                         AND b.status NOT IN ('returned', 'denied', 'cancelled')
                   ) as available
            FROM tools t
            WHERE t.listed
              AND ($1::text IS NULL OR LOWER(t.name) LIKE $1)
              AND ($2::text IS NULL OR t.category = $2)
            ORDER BY t.name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&name_pattern)
        .bind(&query.category)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut tools = Vec::new();
        for row in rows {
            let available: bool = row.get("available");
            tools.push(ToolDetails {
                tool: Tool {
                    id: row.get("id"),
                    owner_id: row.get("owner_id"),
                    name: row.get("name"),
                    description: row.get("description"),
                    category: row.get("category"),
                    condition_notes: row.get("condition_notes"),
                    rental_fee: row.get("rental_fee"),
                    deposit: row.get("deposit"),
                    photo_url: row.get("photo_url"),
                    listed: row.get("listed"),
                    crea_date: row.get("crea_date"),
                    modif_date: row.get("modif_date"),
                },
                available,
            });
        }

        Ok((tools, total))
    }

    /// Tools owned by an account
    pub async fn list_by_owner(&self, owner_id: i32) -> AppResult<Vec<Tool>> {
        let tools = sqlx::query_as::<_, Tool>(
            "SELECT * FROM tools WHERE owner_id = $1 ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tools)
    }

    /// Create a new tool listing
    pub async fn create(&self, owner_id: i32, tool: &CreateTool) -> AppResult<Tool> {
        let created = sqlx::query_as::<_, Tool>(
            r#"
            INSERT INTO tools (owner_id, name, description, category, condition_notes,
                               rental_fee, deposit, photo_url, listed, crea_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&tool.name)
        .bind(&tool.description)
        .bind(&tool.category)
        .bind(&tool.condition_notes)
        .bind(tool.rental_fee.unwrap_or(Decimal::ZERO))
        .bind(tool.deposit.unwrap_or(Decimal::ZERO))
        .bind(&tool.photo_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a tool listing
    pub async fn update(&self, id: i32, tool: &UpdateTool) -> AppResult<Tool> {
        let updated = sqlx::query_as::<_, Tool>(
            r#"
            UPDATE tools SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                condition_notes = COALESCE($5, condition_notes),
                rental_fee = COALESCE($6, rental_fee),
                deposit = COALESCE($7, deposit),
                photo_url = COALESCE($8, photo_url),
                listed = COALESCE($9, listed),
                modif_date = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&tool.name)
        .bind(&tool.description)
        .bind(&tool.category)
        .bind(&tool.condition_notes)
        .bind(tool.rental_fee)
        .bind(tool.deposit)
        .bind(&tool.photo_url)
        .bind(tool.listed)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Tool with id {} not found", id)))
    }

    /// Delete a tool. Refused while a non-terminal borrow exists.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if self.has_open_borrow(id).await? {
            return Err(AppError::StateConflict(
                "Tool has an open borrow and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM tools WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tool with id {} not found", id)));
        }
        Ok(())
    }
}
