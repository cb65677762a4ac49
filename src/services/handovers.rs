//! Handover code service: generation and verification of the shared
//! secrets proving physical tool exchange.

use crate::{
    config::HandoverConfig,
    error::{AppError, AppResult},
    models::{
        account::AccountClaims,
        borrow::{Borrow, BorrowRole, BorrowStatus},
        handover::{looks_like_code, HandoverCode, HandoverKind, VerifyHandover},
        notification::NotificationKind,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct HandoversService {
    repository: Repository,
    config: HandoverConfig,
}

impl HandoversService {
    pub fn new(repository: Repository, config: HandoverConfig) -> Self {
        Self { repository, config }
    }

    /// Generate (or regenerate) the code for an exchange. Only the
    /// generating party for the kind may ask; the previous code is
    /// superseded.
    pub async fn generate(
        &self,
        borrow_id: i32,
        kind: HandoverKind,
        claims: &AccountClaims,
    ) -> AppResult<HandoverCode> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        let role = BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;

        if role != kind.generator() {
            return Err(AppError::Authorization(format!(
                "Only the {} may generate the {} code",
                match kind.generator() {
                    BorrowRole::Lender => "lender",
                    _ => "borrower",
                },
                kind
            )));
        }

        let expected_status = match kind {
            HandoverKind::Pickup => BorrowStatus::Approved,
            HandoverKind::Return => BorrowStatus::Active,
        };
        if borrow.status != expected_status {
            return Err(AppError::StateConflict(format!(
                "A {} code requires the borrow to be {}, it is {}",
                kind, expected_status, borrow.status
            )));
        }

        self.repository
            .handovers
            .issue(borrow_id, kind, self.config.code_length, self.config.expiry_minutes)
            .await
    }

    /// Verify a submitted code. Only the counterparty of the generator may
    /// verify; pickup additionally requires the waiver on file. On success
    /// the borrow advances and both parties are notified; after pickup the
    /// return code is prepared.
    pub async fn verify(
        &self,
        borrow_id: i32,
        kind: HandoverKind,
        claims: &AccountClaims,
        request: &VerifyHandover,
    ) -> AppResult<Borrow> {
        let submitted = request.code.trim().to_uppercase();
        if !looks_like_code(&submitted) {
            return Err(AppError::Validation("Malformed handover code".to_string()));
        }

        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        let role = BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;

        if role != kind.verifier() {
            return Err(AppError::Authorization(format!(
                "Only the {} may verify the {} code",
                match kind.verifier() {
                    BorrowRole::Borrower => "borrower",
                    _ => "lender",
                },
                kind
            )));
        }

        if kind == HandoverKind::Pickup
            && !self.repository.waivers.exists_for_borrow(borrow_id).await?
        {
            return Err(AppError::BusinessRule(
                "The liability waiver must be signed before pickup".to_string(),
            ));
        }

        let borrow = self
            .repository
            .handovers
            .verify(borrow_id, kind, &submitted, request.condition_notes.as_deref())
            .await?;

        let (notification, body) = match kind {
            HandoverKind::Pickup => (
                NotificationKind::PickupConfirmed,
                "Pickup confirmed, the borrow is now active.",
            ),
            HandoverKind::Return => (
                NotificationKind::ReturnConfirmed,
                "Return confirmed, the borrow is complete. You can now rate each other.",
            ),
        };
        for account_id in [borrow.borrower_id, borrow.lender_id] {
            self.repository
                .notifications
                .create(account_id, notification, Some(borrow.id), body)
                .await?;
        }

        // Prepare the return exchange as soon as the tool is out; the
        // borrower can regenerate closer to the actual return.
        if kind == HandoverKind::Pickup {
            self.repository
                .handovers
                .issue(
                    borrow_id,
                    HandoverKind::Return,
                    self.config.code_length,
                    self.config.expiry_minutes,
                )
                .await?;
        }

        tracing::info!(borrow_id, kind = %kind, "handover verified");
        Ok(borrow)
    }
}
