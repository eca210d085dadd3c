//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub stock_count: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Substring matched against title, ISBN and author; empty lists everything
    pub q: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub stock_count: Option<i32>,
}

/// Update book request. Missing fields keep their current value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be blank"))]
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    /// Changing the stock count here is the stock-correction mechanism
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub stock_count: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn create_book_requires_title_and_isbn() {
        let book = CreateBook {
            title: "".to_string(),
            isbn: "978-4-0000-0001-1".to_string(),
            author: None,
            publisher: None,
            stock_count: Some(1),
        };
        assert!(book.validate().is_err());

        let book = CreateBook {
            title: "The Mythical Man-Month".to_string(),
            isbn: "".to_string(),
            author: Some("Brooks".to_string()),
            publisher: None,
            stock_count: Some(1),
        };
        assert!(book.validate().is_err());

        let book = CreateBook {
            title: "The Mythical Man-Month".to_string(),
            isbn: "978-4-0000-0005-9".to_string(),
            author: Some("Brooks".to_string()),
            publisher: Some("Pearson".to_string()),
            stock_count: Some(1),
        };
        assert!(book.validate().is_ok());
    }

    #[test]
    fn stock_count_must_not_be_negative() {
        let book = CreateBook {
            title: "Clean Code".to_string(),
            isbn: "978-4-0000-0007-3".to_string(),
            author: None,
            publisher: None,
            stock_count: Some(-1),
        };
        assert!(book.validate().is_err());
    }
}
