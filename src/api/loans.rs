//! Loan endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanDetails},
    services::circulation::ReturnOutcome,
};

/// Loan list filters
#[derive(Deserialize, ToSchema)]
pub struct LoanFilter {
    /// "active" (default) or "overdue"
    pub status: Option<String>,
}

/// List loans currently out, earliest due first
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(
        ("status" = Option<String>, Query, description = "active (default) or overdue")
    ),
    responses(
        (status = 200, description = "List of loans", body = Vec<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(filter): Query<LoanFilter>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = match filter.status.as_deref() {
        Some("overdue") => state.services.circulation.list_overdue_loans(None).await?,
        _ => state.services.circulation.list_active_loans().await?,
    };
    Ok(Json(loans))
}

/// Get loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<LoanDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.circulation.list_user_loans(&user_id).await?;
    Ok(Json(loans))
}

/// Return a loaned book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned, fine present when overdue", body = ReturnOutcome),
        (status = 404, description = "Loan or book not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<String>,
) -> AppResult<Json<ReturnOutcome>> {
    let outcome = state.services.circulation.return_loan(&loan_id).await?;
    Ok(Json(outcome))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/renew",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan renewed", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned"),
        (status = 422, description = "Maximum renewals reached")
    )
)]
pub async fn renew_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<String>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.circulation.renew_loan(&loan_id).await?;
    Ok(Json(loan))
}
