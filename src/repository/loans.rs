//! Loans repository: the borrow/return ledger

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanDetails, ReturnOutcome},
};

const DETAILS_QUERY: &str = r#"
    SELECT l.id, l.book_id, b.title AS book_title,
           l.loan_date, l.return_deadline, l.return_date,
           (l.return_date IS NULL AND l.return_deadline < CURRENT_DATE) AS is_overdue
    FROM loans l
    JOIN books b ON l.book_id = b.id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            "SELECT id, user_id, book_id, loan_date, return_deadline, return_date FROM loans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get loans for a user with book details, active loans first.
    /// Joins through book_id regardless of the book's deletion flag, so
    /// history stays readable after a logical delete.
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        let loans = sqlx::query_as::<_, LoanDetails>(&format!(
            r#"
            {}
            WHERE l.user_id = $1
            ORDER BY (l.return_date IS NULL) DESC, l.loan_date DESC
            "#,
            DETAILS_QUERY
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Count a user's active (unreturned) loans
    pub async fn count_active_for_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Borrow a book: insert the loan and decrement the stock in one
    /// transaction. The decrement is conditional on `stock_count > 0`, which
    /// serializes two borrows racing for the last copy.
    pub async fn borrow(
        &self,
        user_id: i32,
        book_id: i32,
        return_deadline: NaiveDate,
        max_active: i64,
    ) -> AppResult<(i32, String)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query(
            "SELECT title, stock_count FROM books WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let title: String = book.get("title");
        let stock_count: i32 = book.get("stock_count");

        if stock_count < 1 {
            return Err(AppError::OutOfStock(title));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        // Inclusive comparison: exactly max_active loans blocks the next one
        if active >= max_active {
            return Err(AppError::LoanLimitExceeded {
                current: active,
                max: max_active,
            });
        }

        let decremented = sqlx::query(
            "UPDATE books SET stock_count = stock_count - 1, updated_at = $1 WHERE id = $2 AND stock_count > 0",
        )
        .bind(now)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            // A concurrent borrow took the last copy between the read and the update
            return Err(AppError::OutOfStock(title));
        }

        let loan_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loans (user_id, book_id, loan_date, return_deadline, return_date)
            VALUES ($1, $2, $3, $4, NULL)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(return_deadline)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((loan_id, title))
    }

    /// Return a loan: set return_date and increment the book's stock in one
    /// transaction. The increment is unconditional — the current stock value
    /// is never a precondition for returning a book.
    pub async fn return_loan(&self, loan_id: i32, user_id: i32) -> AppResult<ReturnOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            "SELECT id, user_id, book_id, loan_date, return_deadline, return_date FROM loans WHERE id = $1 FOR UPDATE",
        )
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        // Ownership check applies to everyone, admins included
        if loan.user_id != user_id {
            return Err(AppError::Authorization(
                "Loan belongs to another user".to_string(),
            ));
        }

        if loan.return_date.is_some() {
            drop(tx);
            let details = self.get_details(loan_id).await?;
            return Ok(ReturnOutcome::AlreadyReturned(details));
        }

        sqlx::query("UPDATE loans SET return_date = $1 WHERE id = $2")
            .bind(now)
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET stock_count = stock_count + 1, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let details = self.get_details(loan_id).await?;
        Ok(ReturnOutcome::Returned(details))
    }

    /// Get a single loan with book details
    pub async fn get_details(&self, loan_id: i32) -> AppResult<LoanDetails> {
        sqlx::query_as::<_, LoanDetails>(&format!("{} WHERE l.id = $1", DETAILS_QUERY))
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))
    }
}
