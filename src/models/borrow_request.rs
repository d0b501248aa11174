//! Borrow request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{book::BookSummary, profile::ProfileSummary};

/// Status of a borrow request
///
/// A request is created PENDING and moves exactly once to a terminal
/// APPROVED or REJECTED state. It is never re-opened.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Borrow request record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRequest {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub processed_date: Option<DateTime<Utc>>,
    /// Staff/admin profile that processed the request
    pub processed_by: Option<String>,
    /// Rejection reason
    pub notes: Option<String>,
}

/// Borrow request joined with book and requester for the staff queue
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowRequestDetails {
    pub id: String,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub processed_date: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub notes: Option<String>,
    pub book: BookSummary,
    pub requester: Option<ProfileSummary>,
}
