//! Route definitions for the MedStock web server

use crate::{handlers, openapi, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Sessions
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        // User administration
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        // Catalog
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/items/low-stock", get(handlers::low_stock_items))
        .route("/items/{id}", get(handlers::get_item))
        // Ledger
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
}

/// API documentation routes
pub fn docs_routes() -> Router<AppState> {
    Router::new().route("/api-docs/openapi.json", get(openapi::openapi_json))
}
