//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub cover_image_url: Option<String>,
    /// Copies owned by the library
    pub total_copies: i32,
    /// Copies not currently loaned out (0..=total_copies)
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short book reference embedded in loan and request views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "author must not be empty"))]
    pub author: String,
    #[validate(length(min = 1, message = "isbn must not be empty"))]
    pub isbn: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub cover_image_url: Option<String>,
    #[validate(range(min = 1, message = "total_copies must be at least 1"))]
    pub total_copies: i32,
    /// Defaults to total_copies when omitted
    pub available_copies: Option<i32>,
}

/// Partial book update
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub cover_image_url: Option<String>,
    pub total_copies: Option<i32>,
    pub available_copies: Option<i32>,
}

/// Catalog search query parameters
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BookQuery {
    /// Matches against title, author or ISBN
    pub search: Option<String>,
}
