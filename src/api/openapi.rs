//! OpenAPI documentation

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::api::{books, borrow_requests, fines, health, loans, settings, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GlassLib API",
        version = "0.1.0",
        description = "University Library Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Borrow requests
        borrow_requests::submit_request,
        borrow_requests::list_requests,
        borrow_requests::approve_request,
        borrow_requests::reject_request,
        // Loans
        loans::list_loans,
        loans::get_user_loans,
        loans::return_loan,
        loans::renew_loan,
        // Fines
        fines::list_fines,
        fines::get_user_fines,
        // Stats
        stats::get_stats,
        // Settings
        settings::list_settings,
        settings::get_setting,
        settings::update_setting,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Users
            crate::models::profile::Profile,
            crate::models::profile::ProfileSummary,
            crate::models::profile::CreateProfile,
            crate::models::profile::UpdateProfile,
            crate::models::profile::UserRole,
            // Borrow requests
            crate::models::borrow_request::BorrowRequest,
            crate::models::borrow_request::BorrowRequestDetails,
            crate::models::borrow_request::RequestStatus,
            borrow_requests::SubmitRequest,
            borrow_requests::ApproveRequest,
            borrow_requests::RejectRequest,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanStatus,
            // Fines
            crate::models::fine::Fine,
            fines::UserFinesResponse,
            // Circulation
            crate::services::circulation::ReturnOutcome,
            crate::services::circulation::DashboardCounts,
            // Settings
            crate::models::setting::SystemSetting,
            settings::UpdateSettingRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "users", description = "User profile management"),
        (name = "borrow-requests", description = "Borrow request lifecycle"),
        (name = "loans", description = "Loan checkout, return and renewal"),
        (name = "fines", description = "Late-return fines"),
        (name = "stats", description = "Dashboard statistics"),
        (name = "settings", description = "System settings")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
