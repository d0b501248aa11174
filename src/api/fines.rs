//! Fine endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::fine::Fine};

/// Fine list filters
#[derive(Deserialize, ToSchema)]
pub struct FineFilter {
    pub user_id: Option<String>,
    pub paid: Option<bool>,
}

/// A user's outstanding fines and their total
#[derive(Serialize, ToSchema)]
pub struct UserFinesResponse {
    pub fines: Vec<Fine>,
    pub outstanding_total: f64,
}

/// List fines
#[utoipa::path(
    get,
    path = "/fines",
    tag = "fines",
    params(
        ("user_id" = Option<String>, Query, description = "Filter by user"),
        ("paid" = Option<bool>, Query, description = "Filter by paid flag")
    ),
    responses(
        (status = 200, description = "List of fines", body = Vec<Fine>)
    )
)]
pub async fn list_fines(
    State(state): State<crate::AppState>,
    Query(filter): Query<FineFilter>,
) -> AppResult<Json<Vec<Fine>>> {
    let fines = state
        .services
        .circulation
        .list_fines(filter.user_id.as_deref(), filter.paid)
        .await?;
    Ok(Json(fines))
}

/// Get a user's outstanding fines
#[utoipa::path(
    get,
    path = "/users/{id}/fines",
    tag = "fines",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Outstanding fines", body = UserFinesResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_fines(
    State(state): State<crate::AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserFinesResponse>> {
    state.services.users.get_user(&user_id).await?;

    let fines = state
        .services
        .circulation
        .list_outstanding_fines(&user_id)
        .await?;
    let outstanding_total = state
        .services
        .circulation
        .sum_outstanding_fines(&user_id)
        .await?;

    Ok(Json(UserFinesResponse {
        fines,
        outstanding_total,
    }))
}
