//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub loan_date: DateTime<Utc>,
    pub return_deadline: NaiveDate,
    pub return_date: Option<DateTime<Utc>>,
}

/// Loan with book details for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub loan_date: DateTime<Utc>,
    pub return_deadline: NaiveDate,
    pub return_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

/// Receipt for a successful borrow, returned for user feedback
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowReceipt {
    pub loan_id: i32,
    pub book_title: String,
    pub return_deadline: NaiveDate,
}

/// Outcome of a return request. Returning an already-returned loan is a
/// no-op, not an error: nothing is mutated and the existing record comes back.
#[derive(Debug, Clone)]
pub enum ReturnOutcome {
    Returned(LoanDetails),
    AlreadyReturned(LoanDetails),
}
