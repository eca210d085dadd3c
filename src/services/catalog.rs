//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, UpdateBook},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search the catalog. Empty query lists all non-deleted books.
    pub async fn search_books(&self, query: Option<&str>) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book (admin only)
    pub async fn create_book(&self, claims: &UserClaims, book: CreateBook) -> AppResult<Book> {
        claims.require_admin()?;

        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, title = %created.title, "book created");
        Ok(created)
    }

    /// Update an existing book (admin only)
    pub async fn update_book(&self, claims: &UserClaims, id: i32, book: UpdateBook) -> AppResult<Book> {
        claims.require_admin()?;

        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.books.update(id, &book).await
    }

    /// Delete a book (admin only). Logical delete; refused with Conflict
    /// while active loans reference the book.
    pub async fn delete_book(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require_admin()?;

        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "book deleted (logical)");
        Ok(())
    }
}
