//! Counterparty rating service

use crate::{
    error::{AppError, AppResult},
    models::{
        account::AccountClaims,
        borrow::{BorrowRole, BorrowStatus},
        rating::{CreateRating, Rating, RatingSummary},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RatingsService {
    repository: Repository,
}

impl RatingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Rate the counterparty of a returned borrow. One rating per party
    /// per borrow.
    pub async fn rate(
        &self,
        borrow_id: i32,
        claims: &AccountClaims,
        rating: CreateRating,
    ) -> AppResult<Rating> {
        let borrow = self.repository.borrows.get_by_id(borrow_id).await?;
        let role = BorrowRole::resolve(&borrow, claims.account_id, claims.is_admin())?;

        let ratee_id = match role {
            BorrowRole::Borrower => borrow.lender_id,
            BorrowRole::Lender => borrow.borrower_id,
            BorrowRole::Admin => {
                return Err(AppError::Authorization(
                    "Only the parties to a borrow may rate it".to_string(),
                ));
            }
        };

        if borrow.status != BorrowStatus::Returned {
            return Err(AppError::StateConflict(
                "Rating opens once the borrow is returned".to_string(),
            ));
        }

        self.repository
            .ratings
            .create(borrow_id, claims.account_id, ratee_id, &rating)
            .await
    }

    /// Ratings received by an account
    pub async fn summary_for_account(&self, account_id: i32) -> AppResult<RatingSummary> {
        self.repository.accounts.get_by_id(account_id).await?;
        self.repository.ratings.summary_for_account(account_id).await
    }
}
