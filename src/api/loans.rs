//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{LoanDetails, ReturnOutcome},
};

use super::AuthenticatedUser;

/// Borrow response with the computed deadline
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    /// Loan ID
    pub loan_id: i32,
    /// Title of the borrowed book
    pub book_title: String,
    /// Date the book must be returned by
    pub return_deadline: NaiveDate,
    /// Status message
    pub message: String,
}

/// Return response with loan details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// "returned" or "already_returned"
    pub status: String,
    /// Loan details
    pub loan: LoanDetails,
}

/// Borrow a book for the authenticated user
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Loan created", body = BorrowResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book out of stock"),
        (status = 422, description = "Loan limit reached")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let receipt = state.services.ledger.borrow(&claims, book_id).await?;

    let message = format!(
        "You borrowed '{}'. Return by {}.",
        receipt.book_title, receipt.return_deadline
    );

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            loan_id: receipt.loan_id,
            book_title: receipt.book_title,
            return_deadline: receipt.return_deadline,
            message,
        }),
    ))
}

/// Return a borrowed book.
/// Returning an already-returned loan answers 200 with status
/// "already_returned" and mutates nothing.
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned (or was already returned)", body = ReturnResponse),
        (status = 403, description = "Loan belongs to another user"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let outcome = state.services.ledger.return_loan(&claims, loan_id).await?;

    let (status, loan) = match outcome {
        ReturnOutcome::Returned(loan) => ("returned", loan),
        ReturnOutcome::AlreadyReturned(loan) => ("already_returned", loan),
    };

    Ok(Json(ReturnResponse {
        status: status.to_string(),
        loan,
    }))
}

/// Get loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's loans, active first", body = Vec<LoanDetails>),
        (status = 403, description = "Cannot list another user's loans"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.ledger.list_user_loans(&claims, user_id).await?;
    Ok(Json(loans))
}
