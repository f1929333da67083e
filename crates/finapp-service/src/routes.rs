//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, customers, health, roles, transfers};
use crate::state::AppState;

/// Maximum concurrent requests for the API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 64;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Customers
/// - `POST /v1/customers` - Register a customer
/// - `GET /v1/customers/:customer_id` - Get a customer
/// - `GET /v1/customers/:customer_id/roles` - List a customer's roles
/// - `POST /v1/customer-roles` - Bind a role to a customer
///
/// ## Accounts
/// - `POST /v1/accounts` - Open an account
/// - `GET /v1/accounts/:account_id` - Get an account
/// - `GET /v1/accounts/:account_id/history` - List an account's audit trail
///
/// ## Transfers
/// - `POST /v1/transfers` - Move money between two accounts
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Customers
        .route("/customers", post(customers::create_customer))
        .route("/customers/:customer_id", get(customers::get_customer))
        .route("/customers/:customer_id/roles", get(roles::list_customer_roles))
        .route("/customer-roles", post(roles::create_customer_role))
        // Accounts
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/:account_id", get(accounts::get_account))
        .route("/accounts/:account_id/history", get(accounts::get_history))
        // Transfers
        .route("/transfers", post(transfers::move_account_balance))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
