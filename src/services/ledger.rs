//! Loan ledger service: borrow/return state transitions and stock accounting

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::{
    config::LoanPolicyConfig,
    error::{AppError, AppResult},
    models::{
        loan::{BorrowReceipt, LoanDetails, ReturnOutcome},
        user::UserClaims,
    },
    repository::Repository,
};

/// Compute the return deadline: `period_days` from `from`, pushed to the
/// following Monday when it lands on a weekend.
pub fn compute_return_deadline(from: NaiveDate, period_days: i64) -> NaiveDate {
    let deadline = from + Duration::days(period_days);
    match deadline.weekday() {
        Weekday::Sat => deadline + Duration::days(2),
        Weekday::Sun => deadline + Duration::days(1),
        _ => deadline,
    }
}

#[derive(Clone)]
pub struct LedgerService {
    repository: Repository,
    policy: LoanPolicyConfig,
}

impl LedgerService {
    pub fn new(repository: Repository, policy: LoanPolicyConfig) -> Self {
        Self { repository, policy }
    }

    /// Borrow a book for the authenticated user
    pub async fn borrow(&self, claims: &UserClaims, book_id: i32) -> AppResult<BorrowReceipt> {
        let deadline = compute_return_deadline(Utc::now().date_naive(), self.policy.period_days);

        let (loan_id, book_title) = self
            .repository
            .loans
            .borrow(claims.user_id, book_id, deadline, self.policy.max_active)
            .await?;

        tracing::info!(
            user_id = claims.user_id,
            book_id,
            loan_id,
            %deadline,
            "book borrowed"
        );

        Ok(BorrowReceipt {
            loan_id,
            book_title,
            return_deadline: deadline,
        })
    }

    /// Return a borrowed book. Only the loan's owner may return it; the
    /// admin role grants no bypass here.
    pub async fn return_loan(&self, claims: &UserClaims, loan_id: i32) -> AppResult<ReturnOutcome> {
        let outcome = self
            .repository
            .loans
            .return_loan(loan_id, claims.user_id)
            .await?;

        if let ReturnOutcome::Returned(ref details) = outcome {
            tracing::info!(
                user_id = claims.user_id,
                loan_id,
                book_id = details.book_id,
                "book returned"
            );
        }

        Ok(outcome)
    }

    /// List loans for a user. Users see their own loans; admins may see anyone's.
    pub async fn list_user_loans(
        &self,
        claims: &UserClaims,
        user_id: i32,
    ) -> AppResult<Vec<LoanDetails>> {
        if claims.user_id != user_id && !claims.is_admin() {
            return Err(AppError::Authorization(
                "Cannot list another user's loans".to_string(),
            ));
        }

        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.get_user_loans(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::compute_return_deadline;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekday_deadline_is_unchanged() {
        // 2026-02-03 (Tue) + 14 = 2026-02-17 (Tue)
        assert_eq!(
            compute_return_deadline(date(2026, 2, 3), 14),
            date(2026, 2, 17)
        );
    }

    #[test]
    fn saturday_deadline_moves_to_monday() {
        // 2026-01-31 + 14 = 2026-02-14 (Sat) -> 2026-02-16 (Mon)
        assert_eq!(
            compute_return_deadline(date(2026, 1, 31), 14),
            date(2026, 2, 16)
        );
    }

    #[test]
    fn sunday_deadline_moves_to_monday() {
        // 2026-02-01 + 14 = 2026-02-15 (Sun) -> 2026-02-16 (Mon)
        assert_eq!(
            compute_return_deadline(date(2026, 2, 1), 14),
            date(2026, 2, 16)
        );
    }

    #[test]
    fn deadline_honors_configured_period() {
        // 2026-02-02 (Mon) + 7 = 2026-02-09 (Mon)
        assert_eq!(
            compute_return_deadline(date(2026, 2, 2), 7),
            date(2026, 2, 9)
        );
    }
}
