//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{book::BookSummary, profile::ProfileSummary};

/// Stored status of a loan
///
/// OVERDUE is primarily a derived display value: the engine compares
/// due_date against the clock at read time and at return time rather than
/// relying on the stored field being kept in sync by a background job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
}

/// Loan record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub renewed_count: i32,
    /// Staff profile that approved the originating request
    pub checked_out_by: Option<String>,
}

/// Loan joined with book and borrower for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    pub id: String,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub renewed_count: i32,
    /// Computed against the clock at read time
    pub is_overdue: bool,
    pub book: BookSummary,
    pub borrower: Option<ProfileSummary>,
}
