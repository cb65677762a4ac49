//! Borrow lifecycle service
//!
//! Request, approve/deny, cancel and extend live here; the handover
//! confirmations that drive approved -> active -> returned live in the
//! handover service.

use crate::{
    config::{HandoverConfig, LendingConfig},
    error::{AppError, AppResult},
    models::{
        account::AccountClaims,
        borrow::{Borrow, BorrowDetails, BorrowQuery, BorrowRole, CreateBorrow},
        handover::{HandoverCode, HandoverKind},
        notification::NotificationKind,
    },
    repository::Repository,
    services::rate_limit::RateLimitService,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
    lending: LendingConfig,
    handover: HandoverConfig,
    rate_limit: RateLimitService,
}

impl BorrowsService {
    pub fn new(
        repository: Repository,
        lending: LendingConfig,
        handover: HandoverConfig,
        rate_limit: RateLimitService,
    ) -> Self {
        Self { repository, lending, handover, rate_limit }
    }

    /// Request to borrow a tool. Throttled per requesting account.
    pub async fn request(&self, borrower_id: i32, request: CreateBorrow) -> AppResult<Borrow> {
        self.rate_limit
            .enforce("borrow_request", &borrower_id.to_string())
            .await?;

        let borrow = self.repository.borrows.create(request.tool_id, borrower_id).await?;

        let tool = self.repository.tools.get_by_id(borrow.tool_id).await?;
        let body = match request.message.as_deref() {
            Some(msg) => format!("New borrow request for '{}': {}", tool.name, msg),
            None => format!("New borrow request for '{}'", tool.name),
        };
        self.repository
            .notifications
            .create(borrow.lender_id, NotificationKind::BorrowRequested, Some(borrow.id), &body)
            .await?;

        tracing::info!(borrow_id = borrow.id, tool_id = borrow.tool_id, "borrow requested");
        Ok(borrow)
    }

    /// Get borrow details; parties and admins only
    pub async fn get_details(&self, borrow_id: i32, claims: &AccountClaims) -> AppResult<BorrowDetails> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;
        self.repository.borrows.get_details(borrow_id).await
    }

    /// List the caller's borrows; admins see all
    pub async fn list(&self, claims: &AccountClaims, query: &BorrowQuery) -> AppResult<Vec<BorrowDetails>> {
        if claims.is_admin() && query.role.is_none() {
            self.repository.borrows.list_all(query).await
        } else {
            self.repository.borrows.list_for_account(claims.account_id, query).await
        }
    }

    /// Approve a request. Lender only. Stamps the due date and issues the
    /// pickup code the borrower will have to present.
    pub async fn approve(
        &self,
        borrow_id: i32,
        claims: &AccountClaims,
    ) -> AppResult<(Borrow, HandoverCode)> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        self.require_role(&borrow, claims, BorrowRole::Lender, "approve")?;

        let borrow = self.repository.borrows.approve(borrow_id, self.lending.loan_days).await?;

        let code = self
            .repository
            .handovers
            .issue(
                borrow_id,
                HandoverKind::Pickup,
                self.handover.code_length,
                self.handover.expiry_minutes,
            )
            .await?;

        self.repository
            .notifications
            .create(
                borrow.borrower_id,
                NotificationKind::BorrowApproved,
                Some(borrow.id),
                "Your borrow request was approved. Sign the waiver before pickup.",
            )
            .await?;

        tracing::info!(borrow_id, "borrow approved");
        Ok((borrow, code))
    }

    /// Deny a request. Lender only, terminal.
    pub async fn deny(&self, borrow_id: i32, claims: &AccountClaims) -> AppResult<Borrow> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        self.require_role(&borrow, claims, BorrowRole::Lender, "deny")?;

        let borrow = self.repository.borrows.deny(borrow_id).await?;

        self.repository
            .notifications
            .create(
                borrow.borrower_id,
                NotificationKind::BorrowDenied,
                Some(borrow.id),
                "Your borrow request was denied.",
            )
            .await?;

        Ok(borrow)
    }

    /// Cancel a request or an approved borrow. Borrower only, terminal.
    pub async fn cancel(&self, borrow_id: i32, claims: &AccountClaims) -> AppResult<Borrow> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        self.require_role(&borrow, claims, BorrowRole::Borrower, "cancel")?;

        let borrow = self.repository.borrows.cancel(borrow_id).await?;

        self.repository
            .notifications
            .create(
                borrow.lender_id,
                NotificationKind::BorrowCancelled,
                Some(borrow.id),
                "The borrower cancelled the request.",
            )
            .await?;

        Ok(borrow)
    }

    /// Extend an active borrow's due date. Borrower only, bounded.
    pub async fn extend(&self, borrow_id: i32, claims: &AccountClaims) -> AppResult<Borrow> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        self.require_role(&borrow, claims, BorrowRole::Borrower, "extend")?;

        self.repository
            .borrows
            .extend(borrow_id, self.lending.extension_days, self.lending.max_extensions)
            .await
    }

    /// Lifecycle actions are party-bound: acting as admin does not
    /// substitute for being the required party.
    fn require_role(
        &self,
        borrow: &Borrow,
        claims: &AccountClaims,
        required: BorrowRole,
        action: &str,
    ) -> AppResult<()> {
        let role = BorrowRole::resolve(borrow, claims.account_id, claims.is_admin())?;
        if role != required {
            return Err(AppError::Authorization(format!(
                "Only the {} may {} this borrow",
                match required {
                    BorrowRole::Borrower => "borrower",
                    BorrowRole::Lender => "lender",
                    BorrowRole::Admin => "admin",
                },
                action
            )));
        }
        Ok(())
    }
}
