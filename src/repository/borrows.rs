//! Borrows repository: lifecycle transitions run in single transactions
//! with row-level locks so concurrent actions on the same borrow serialize.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        account::AccountShort,
        borrow::{Borrow, BorrowDetails, BorrowQuery, BorrowStatus, BorrowTransition},
    },
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

const DETAILS_SELECT: &str = r#"
    SELECT b.*, t.name as tool_name,
           ab.display_name as borrower_name,
           (SELECT AVG(score)::float8 FROM ratings WHERE ratee_id = b.borrower_id) as borrower_rating,
           (SELECT COUNT(*) FROM ratings WHERE ratee_id = b.borrower_id) as borrower_nb_ratings,
           al.display_name as lender_name,
           (SELECT AVG(score)::float8 FROM ratings WHERE ratee_id = b.lender_id) as lender_rating,
           (SELECT COUNT(*) FROM ratings WHERE ratee_id = b.lender_id) as lender_nb_ratings
    FROM borrows b
    JOIN tools t ON b.tool_id = t.id
    JOIN accounts ab ON b.borrower_id = ab.id
    JOIN accounts al ON b.lender_id = al.id
"#;

fn details_from_row(row: &sqlx::postgres::PgRow) -> BorrowDetails {
    let due_date: Option<DateTime<Utc>> = row.get("due_date");
    let status: BorrowStatus = row.get("status");
    let now = Utc::now();

    BorrowDetails {
        id: row.get("id"),
        status,
        tool_id: row.get("tool_id"),
        tool_name: row.get("tool_name"),
        borrower: AccountShort {
            id: row.get("borrower_id"),
            display_name: row.get("borrower_name"),
            avg_rating: row.get("borrower_rating"),
            nb_ratings: row.get("borrower_nb_ratings"),
        },
        lender: AccountShort {
            id: row.get("lender_id"),
            display_name: row.get("lender_name"),
            avg_rating: row.get("lender_rating"),
            nb_ratings: row.get("lender_nb_ratings"),
        },
        requested_date: row.get("requested_date"),
        approved_date: row.get("approved_date"),
        due_date,
        returned_date: row.get("returned_date"),
        rental_fee: row.get("rental_fee"),
        deposit: row.get("deposit"),
        nb_extensions: row.get("nb_extensions"),
        is_overdue: status == BorrowStatus::Active
            && due_date.map(|d| d < now).unwrap_or(false),
    }
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrow> {
        sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))
    }

    /// Get borrow with joined tool and counterparty summaries
    pub async fn get_details(&self, id: i32) -> AppResult<BorrowDetails> {
        let row = sqlx::query(&format!("{} WHERE b.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))?;

        Ok(details_from_row(&row))
    }

    /// List borrows where the account is a party, newest first
    pub async fn list_for_account(
        &self,
        account_id: i32,
        query: &BorrowQuery,
    ) -> AppResult<Vec<BorrowDetails>> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        // role filter: borrower / lender / both when absent
        let (as_borrower, as_lender) = match query.role.as_deref() {
            Some("borrower") => (true, false),
            Some("lender") => (false, true),
            _ => (true, true),
        };

        let rows = sqlx::query(&format!(
            r#"{}
            WHERE (($2 AND b.borrower_id = $1) OR ($3 AND b.lender_id = $1))
              AND ($4::text IS NULL OR b.status = $4)
            ORDER BY b.requested_date DESC
            LIMIT $5 OFFSET $6
            "#,
            DETAILS_SELECT
        ))
        .bind(account_id)
        .bind(as_borrower)
        .bind(as_lender)
        .bind(query.status.map(|s| s.as_str().to_string()))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(details_from_row).collect())
    }

    /// List all borrows (admin), newest first
    pub async fn list_all(&self, query: &BorrowQuery) -> AppResult<Vec<BorrowDetails>> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let rows = sqlx::query(&format!(
            r#"{}
            WHERE ($1::text IS NULL OR b.status = $1)
            ORDER BY b.requested_date DESC
            LIMIT $2 OFFSET $3
            "#,
            DETAILS_SELECT
        ))
        .bind(query.status.map(|s| s.as_str().to_string()))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(details_from_row).collect())
    }

    /// Create a borrow request. The tool row is locked for the duration of
    /// the availability check so two concurrent requests cannot both pass.
    pub async fn create(&self, tool_id: i32, borrower_id: i32) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let tool_row = sqlx::query(
            "SELECT owner_id, listed, rental_fee, deposit FROM tools WHERE id = $1 FOR UPDATE",
        )
        .bind(tool_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tool with id {} not found", tool_id)))?;

        let owner_id: i32 = tool_row.get("owner_id");
        let listed: bool = tool_row.get("listed");

        if owner_id == borrower_id {
            return Err(AppError::Validation(
                "Cannot borrow your own tool".to_string(),
            ));
        }
        if !listed {
            return Err(AppError::BusinessRule("Tool is not listed".to_string()));
        }

        let already_out: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrows
                WHERE tool_id = $1
                  AND status NOT IN ('returned', 'denied', 'cancelled')
            )
            "#,
        )
        .bind(tool_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_out {
            return Err(AppError::StateConflict(
                "Tool already has an open borrow".to_string(),
            ));
        }

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (tool_id, borrower_id, lender_id, status, requested_date,
                                 rental_fee, deposit, nb_extensions)
            VALUES ($1, $2, $3, 'requested', $4, $5, $6, 0)
            RETURNING *
            "#,
        )
        .bind(tool_id)
        .bind(borrower_id)
        .bind(owner_id)
        .bind(Utc::now())
        .bind(tool_row.get::<rust_decimal::Decimal, _>("rental_fee"))
        .bind(tool_row.get::<rust_decimal::Decimal, _>("deposit"))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(borrow)
    }

    /// Approve a request: stamps approval and due date. Locks the borrow
    /// row and re-checks the state guard under the lock.
    pub async fn approve(&self, id: i32, loan_days: i64) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_status(&mut tx, id).await?;
        BorrowTransition::Approve.guard(current)?;

        let now = Utc::now();
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows SET status = 'approved', approved_date = $2, due_date = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(now + Duration::days(loan_days))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(borrow)
    }

    /// Deny a request (terminal)
    pub async fn deny(&self, id: i32) -> AppResult<Borrow> {
        self.terminal_transition(id, BorrowTransition::Deny).await
    }

    /// Cancel a request (terminal, borrower-initiated)
    pub async fn cancel(&self, id: i32) -> AppResult<Borrow> {
        self.terminal_transition(id, BorrowTransition::Cancel).await
    }

    async fn terminal_transition(&self, id: i32, transition: BorrowTransition) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_status(&mut tx, id).await?;
        let target = transition.guard(current)?;

        let borrow = sqlx::query_as::<_, Borrow>(
            "UPDATE borrows SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(target)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(borrow)
    }

    /// Extend an active borrow's due date, bounded by `max_extensions`
    pub async fn extend(
        &self,
        id: i32,
        extension_days: i64,
        max_extensions: i16,
    ) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status, due_date, nb_extensions FROM borrows WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))?;

        let current: BorrowStatus = row.get("status");
        BorrowTransition::Extend.guard(current)?;

        let nb_extensions: i16 = row.get("nb_extensions");
        if nb_extensions >= max_extensions {
            return Err(AppError::BusinessRule(format!(
                "Maximum extensions reached ({}/{})",
                nb_extensions, max_extensions
            )));
        }

        let due_date: Option<DateTime<Utc>> = row.get("due_date");
        let base = due_date.unwrap_or_else(Utc::now);

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows SET due_date = $2, nb_extensions = nb_extensions + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(base + Duration::days(extension_days))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(borrow)
    }

    pub(crate) async fn lock_status(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<BorrowStatus> {
        let row = sqlx::query("SELECT status FROM borrows WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))?;
        Ok(row.get("status"))
    }
}
