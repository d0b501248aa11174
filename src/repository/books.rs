//! Books repository for catalog database operations

use chrono::Utc;
use sqlx::{Pool, Sqlite, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::book::Book,
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book by ISBN
    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = ?1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// List books, optionally filtered by a search term on title/author/ISBN
    pub async fn list(&self, search: Option<&str>) -> AppResult<Vec<Book>> {
        let books = match search {
            Some(term) if !term.trim().is_empty() => {
                let pattern = format!("%{}%", term.trim());
                sqlx::query_as::<_, Book>(
                    r#"
                    SELECT * FROM books
                    WHERE title LIKE ?1 OR author LIKE ?1 OR isbn LIKE ?1
                    ORDER BY title
                    "#,
                )
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(books)
    }

    /// Insert a new book
    pub async fn create(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, isbn, description, genre, cover_image_url,
                total_copies, available_copies, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.genre)
        .bind(&book.cover_image_url)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Write back a full book row
    pub async fn update(&self, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books SET
                title = ?2, author = ?3, isbn = ?4, description = ?5, genre = ?6,
                cover_image_url = ?7, total_copies = ?8, available_copies = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.genre)
        .bind(&book.cover_image_url)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a book, returns false when it did not exist
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch a book inside an open circulation transaction
    pub async fn get_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
    ) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(book)
    }

    /// Take one available copy. Returns false when no copy was available,
    /// leaving the row untouched.
    pub async fn reserve_copy(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = ?2
            WHERE id = ?1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Put one copy back. Deliberately not capped against total_copies:
    /// approve and return are paired 1:1, so a correctly driven system
    /// never exceeds the total.
    pub async fn release_copy(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
