//! Catalog service
//!
//! Field-level validation over the books store. Availability arithmetic is
//! owned by the circulation engine, never done here.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
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

    /// List books, optionally filtered by a search term
    pub async fn list_books(&self, search: Option<&str>) -> AppResult<Vec<Book>> {
        self.repository.books.list(search).await
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, create: CreateBook) -> AppResult<Book> {
        create
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.books.find_by_isbn(&create.isbn).await?.is_some() {
            return Err(AppError::Validation(format!(
                "A book with ISBN {} already exists",
                create.isbn
            )));
        }

        let available_copies = create.available_copies.unwrap_or(create.total_copies);
        validate_copy_counts(create.total_copies, available_copies)?;

        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: create.title,
            author: create.author,
            isbn: create.isbn,
            description: create.description,
            genre: create.genre,
            cover_image_url: create.cover_image_url,
            total_copies: create.total_copies,
            available_copies,
            created_at: now,
            updated_at: now,
        };

        self.repository.books.create(&book).await?;
        tracing::info!(book_id = %book.id, isbn = %book.isbn, "book added to catalog");
        Ok(book)
    }

    /// Apply a partial update to a book
    pub async fn update_book(&self, id: &str, update: UpdateBook) -> AppResult<Book> {
        let mut book = self.repository.books.get_by_id(id).await?;

        if let Some(isbn) = &update.isbn {
            if isbn.trim().is_empty() {
                return Err(AppError::Validation("isbn must not be empty".to_string()));
            }
            if isbn != &book.isbn {
                if self.repository.books.find_by_isbn(isbn).await?.is_some() {
                    return Err(AppError::Validation(format!(
                        "A book with ISBN {} already exists",
                        isbn
                    )));
                }
                book.isbn = isbn.clone();
            }
        }
        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("title must not be empty".to_string()));
            }
            book.title = title;
        }
        if let Some(author) = update.author {
            if author.trim().is_empty() {
                return Err(AppError::Validation("author must not be empty".to_string()));
            }
            book.author = author;
        }
        if update.description.is_some() {
            book.description = update.description;
        }
        if update.genre.is_some() {
            book.genre = update.genre;
        }
        if update.cover_image_url.is_some() {
            book.cover_image_url = update.cover_image_url;
        }
        if let Some(total) = update.total_copies {
            book.total_copies = total;
        }
        if let Some(available) = update.available_copies {
            book.available_copies = available;
        }

        validate_copy_counts(book.total_copies, book.available_copies)?;

        book.updated_at = Utc::now();
        self.repository.books.update(&book).await?;
        Ok(book)
    }

    /// Remove a book from the catalog
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        tracing::info!(book_id = %id, "book removed from catalog");
        Ok(())
    }
}

fn validate_copy_counts(total: i32, available: i32) -> AppResult<()> {
    if total < 1 {
        return Err(AppError::Validation(
            "total_copies must be at least 1".to_string(),
        ));
    }
    if available < 0 || available > total {
        return Err(AppError::Validation(format!(
            "available_copies must be between 0 and {}",
            total
        )));
    }
    Ok(())
}
