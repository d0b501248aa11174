//! Fine model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Fine assessed on a late return
///
/// Created only as a side effect of returning an overdue loan and immutable
/// afterwards except for the paid/paid_at transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub id: String,
    pub user_id: String,
    pub loan_id: String,
    /// Currency units, days overdue x daily rate
    pub amount: f64,
    pub paid: bool,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}
