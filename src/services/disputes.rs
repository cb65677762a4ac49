//! Dispute escalation service

use crate::{
    error::{AppError, AppResult},
    models::{
        account::AccountClaims,
        borrow::{BorrowRole, BorrowStatus},
        dispute::{
            Dispute, DisputeDetails, DisputeMessage, DisputeQuery, OpenDispute, PostDisputeMessage,
            ResolveDispute,
        },
        notification::NotificationKind,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct DisputesService {
    repository: Repository,
}

impl DisputesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Open a dispute against a borrow. Either party, once the borrow has
    /// left the requested state, one dispute per borrow.
    pub async fn open(
        &self,
        borrow_id: i32,
        claims: &AccountClaims,
        request: OpenDispute,
    ) -> AppResult<Dispute> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        let role = BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;

        let counterparty = match role {
            BorrowRole::Borrower => borrow.lender_id,
            BorrowRole::Lender => borrow.borrower_id,
            BorrowRole::Admin => {
                return Err(AppError::Authorization(
                    "Only the parties to a borrow may open a dispute".to_string(),
                ));
            }
        };

        if borrow.status == BorrowStatus::Requested {
            return Err(AppError::StateConflict(
                "A dispute cannot be opened before the request is decided".to_string(),
            ));
        }

        let dispute = self
            .repository
            .disputes
            .create(borrow_id, claims.account_id, &request)
            .await?;

        self.repository
            .notifications
            .create(
                counterparty,
                NotificationKind::DisputeOpened,
                Some(borrow_id),
                &format!("A dispute was opened: {}", request.subject),
            )
            .await?;

        tracing::info!(borrow_id, dispute_id = dispute.id, "dispute opened");
        Ok(dispute)
    }

    /// Dispute with thread; parties of the underlying borrow and admins
    pub async fn get_details(&self, dispute_id: i32, claims: &AccountClaims) -> AppResult<DisputeDetails> {
        let dispute = self.repository.disputes.get_by_id(dispute_id).await?;
        self.require_participant(&dispute, claims).await?;
        self.repository.disputes.get_details(dispute_id).await
    }

    /// Post to an open dispute thread
    pub async fn post_message(
        &self,
        dispute_id: i32,
        claims: &AccountClaims,
        request: PostDisputeMessage,
    ) -> AppResult<DisputeMessage> {
        let dispute = self.repository.disputes.get_by_id(dispute_id).await?;
        self.require_participant(&dispute, claims).await?;

        self.repository
            .disputes
            .add_message(dispute_id, claims.account_id, &request.body)
            .await
    }

    /// Resolve an open dispute. Admin only; both parties are notified.
    pub async fn resolve(
        &self,
        dispute_id: i32,
        claims: &AccountClaims,
        request: ResolveDispute,
    ) -> AppResult<Dispute> {
        claims.require_admin()?;

        let dispute = self
            .repository
            .disputes
            .resolve(dispute_id, &request.resolution_note)
            .await?;

        let borrow = self.repository.borrows.get_by_id(dispute.borrow_id).await?;
        for account_id in [borrow.borrower_id, borrow.lender_id] {
            self.repository
                .notifications
                .create(
                    account_id,
                    NotificationKind::DisputeResolved,
                    Some(borrow.id),
                    &format!("The dispute was resolved: {}", request.resolution_note),
                )
                .await?;
        }

        Ok(dispute)
    }

    /// List disputes (admin)
    pub async fn list(&self, claims: &AccountClaims, query: &DisputeQuery) -> AppResult<(Vec<Dispute>, i64)> {
        claims.require_admin()?;
        self.repository.disputes.list(query).await
    }

    async fn require_participant(&self, dispute: &Dispute, claims: &AccountClaims) -> AppResult<()> {
        let borrow = self.repository.borrows.get_by_id(dispute.borrow_id).await?;
        BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;
        Ok(())
    }
}
