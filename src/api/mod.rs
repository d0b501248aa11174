//! API handlers for the GlassLib REST endpoints

pub mod books;
pub mod borrow_requests;
pub mod fines;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod settings;
pub mod stats;
pub mod users;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id", put(books::update_book))
        .route("/books/:id", delete(books::delete_book))
        // Users
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id", put(users::update_user))
        .route("/users/:id", delete(users::delete_user))
        .route("/users/:id/loans", get(loans::get_user_loans))
        .route("/users/:id/fines", get(fines::get_user_fines))
        // Borrow requests
        .route("/borrow-requests", post(borrow_requests::submit_request))
        .route("/borrow-requests", get(borrow_requests::list_requests))
        .route(
            "/borrow-requests/:id/approve",
            post(borrow_requests::approve_request),
        )
        .route(
            "/borrow-requests/:id/reject",
            post(borrow_requests::reject_request),
        )
        // Loans
        .route("/loans", get(loans::list_loans))
        .route("/loans/:id/return", post(loans::return_loan))
        .route("/loans/:id/renew", post(loans::renew_loan))
        // Fines
        .route("/fines", get(fines::list_fines))
        // Statistics
        .route("/stats", get(stats::get_stats))
        // Settings
        .route("/settings", get(settings::list_settings))
        .route("/settings/:key", get(settings::get_setting))
        .route("/settings/:key", put(settings::update_setting))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
