//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
};

/// Escape LIKE metacharacters so user input matches literally.
/// The pattern is always bound as a parameter; this only neutralizes
/// `%`, `_` and the escape character itself.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

const BOOK_COLUMNS: &str =
    "id, title, isbn, author, publisher, stock_count, is_deleted, created_at, updated_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a non-deleted book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 AND is_deleted = FALSE",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search non-deleted books. An empty query lists the whole catalog,
    /// most recently added first.
    pub async fn search(&self, query: Option<&str>) -> AppResult<Vec<Book>> {
        let term = query.map(str::trim).filter(|q| !q.is_empty());

        let books = match term {
            Some(q) => {
                let pattern = format!("%{}%", escape_like(q));
                sqlx::query_as::<_, Book>(&format!(
                    r#"
                    SELECT {}
                    FROM books
                    WHERE is_deleted = FALSE
                      AND (title ILIKE $1 OR isbn ILIKE $1 OR author ILIKE $1)
                    ORDER BY id DESC
                    "#,
                    BOOK_COLUMNS
                ))
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Book>(&format!(
                    "SELECT {} FROM books WHERE is_deleted = FALSE ORDER BY id DESC",
                    BOOK_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(books)
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, isbn, author, publisher, stock_count, is_deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.stock_count.unwrap_or(0))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update an existing book. Missing fields keep their current value.
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let now = Utc::now();

        let updated = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                isbn = COALESCE($2, isbn),
                author = COALESCE($3, author),
                publisher = COALESCE($4, publisher),
                stock_count = COALESCE($5, stock_count),
                updated_at = $6
            WHERE id = $7 AND is_deleted = FALSE
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(book.title.as_deref())
        .bind(book.isbn.as_deref())
        .bind(book.author.as_deref())
        .bind(book.publisher.as_deref())
        .bind(book.stock_count)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(updated)
    }

    /// Delete a book (logical delete — sets is_deleted).
    /// Refused while the book has active loans, so loan history never
    /// references a vanished row.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active_loans > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete book: {} active loan(s) exist",
                active_loans
            )));
        }

        sqlx::query("UPDATE books SET is_deleted = TRUE, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("O'Reilly"), "O'Reilly");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like(""), "");
    }
}
