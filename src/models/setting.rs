//! System setting model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Named configuration value
///
/// Settings are read at the moment of each circulation transition, so a
/// change affects only loans and fines computed after it; existing due
/// dates are never recalculated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SystemSetting {
    pub setting_key: String,
    pub setting_value: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}
