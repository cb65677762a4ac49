//! Liability waiver service

use crate::{
    error::{AppError, AppResult},
    models::{
        account::AccountClaims,
        borrow::{BorrowRole, BorrowStatus},
        waiver::{SignWaiver, Waiver},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct WaiversService {
    repository: Repository,
}

impl WaiversService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Sign the waiver for a borrow. Borrower only, from approval onward,
    /// at most once.
    pub async fn sign(
        &self,
        borrow_id: i32,
        claims: &AccountClaims,
        request: SignWaiver,
    ) -> AppResult<Waiver> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        let role = BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;
        if role != BorrowRole::Borrower {
            return Err(AppError::Authorization(
                "Only the borrower signs the waiver".to_string(),
            ));
        }

        match borrow.status {
            BorrowStatus::Approved | BorrowStatus::Active => {}
            other => {
                return Err(AppError::StateConflict(format!(
                    "A waiver cannot be signed while the borrow is {}",
                    other
                )));
            }
        }

        if !request.condition_ack {
            return Err(AppError::Validation(
                "The tool condition must be acknowledged".to_string(),
            ));
        }

        self.repository
            .waivers
            .create(borrow_id, claims.account_id, &request)
            .await
    }

    /// Waiver on file for a borrow; parties and admins only
    pub async fn get(&self, borrow_id: i32, claims: &AccountClaims) -> AppResult<Waiver> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;

        self.repository
            .waivers
            .get_by_borrow(borrow_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No waiver on file for this borrow".to_string()))
    }
}
