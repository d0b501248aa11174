//! Dashboard statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, services::circulation::DashboardCounts};

/// Aggregate counts for the staff/admin dashboards
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Dashboard counts", body = DashboardCounts)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
) -> AppResult<Json<DashboardCounts>> {
    let counts = state.services.circulation.dashboard_counts().await?;
    Ok(Json(counts))
}
