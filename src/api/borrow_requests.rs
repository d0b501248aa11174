//! Borrow request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        borrow_request::{BorrowRequest, BorrowRequestDetails, RequestStatus},
        loan::Loan,
    },
};

/// Submit borrow request payload
#[derive(Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Requesting student
    pub user_id: String,
    /// Requested book
    pub book_id: String,
}

/// Approve payload
#[derive(Deserialize, ToSchema)]
pub struct ApproveRequest {
    /// Staff/admin processing the request
    pub staff_id: String,
}

/// Reject payload
#[derive(Deserialize, ToSchema)]
pub struct RejectRequest {
    /// Staff/admin processing the request
    pub staff_id: String,
    /// Rejection reason shown to the student
    pub reason: String,
}

/// Request list filters
#[derive(Deserialize, ToSchema)]
pub struct RequestFilter {
    pub user_id: Option<String>,
    pub status: Option<RequestStatus>,
}

/// Submit a borrow request
#[utoipa::path(
    post,
    path = "/borrow-requests",
    tag = "borrow-requests",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Request submitted", body = BorrowRequest),
        (status = 404, description = "Book not found")
    )
)]
pub async fn submit_request(
    State(state): State<crate::AppState>,
    Json(request): Json<SubmitRequest>,
) -> AppResult<(StatusCode, Json<BorrowRequest>)> {
    let created = state
        .services
        .circulation
        .submit_borrow_request(&request.user_id, &request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List borrow requests with book and requester details
#[utoipa::path(
    get,
    path = "/borrow-requests",
    tag = "borrow-requests",
    params(
        ("user_id" = Option<String>, Query, description = "Filter by requesting user"),
        ("status" = Option<RequestStatus>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "List of requests", body = Vec<BorrowRequestDetails>)
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    Query(filter): Query<RequestFilter>,
) -> AppResult<Json<Vec<BorrowRequestDetails>>> {
    let requests = state
        .services
        .circulation
        .list_borrow_requests(filter.user_id.as_deref(), filter.status)
        .await?;
    Ok(Json(requests))
}

/// Approve a pending borrow request, creating a loan
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/approve",
    tag = "borrow-requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Loan created", body = Loan),
        (status = 404, description = "Request or book not found"),
        (status = 409, description = "Request already processed"),
        (status = 422, description = "No copies available")
    )
)]
pub async fn approve_request(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(request): Json<ApproveRequest>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .circulation
        .approve_borrow_request(&id, &request.staff_id)
        .await?;
    Ok(Json(loan))
}

/// Reject a pending borrow request
#[utoipa::path(
    post,
    path = "/borrow-requests/{id}/reject",
    tag = "borrow-requests",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Request rejected", body = BorrowRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed"),
        (status = 422, description = "Empty rejection reason")
    )
)]
pub async fn reject_request(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> AppResult<Json<BorrowRequest>> {
    let rejected = state
        .services
        .circulation
        .reject_borrow_request(&id, &request.staff_id, &request.reason)
        .await?;
    Ok(Json(rejected))
}
