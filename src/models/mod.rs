//! Data models for Biblin

pub mod book;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use loan::{Loan, LoanDetails};
pub use user::{User, UserClaims};
