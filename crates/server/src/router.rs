//! HTTP router construction.
//!
//! Assembles all Axum routes and middleware into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Invalid CORS_ORIGIN '{}': {}, allowing any origin", origin, e);
            CorsLayer::permissive()
        }
    }
}

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        // Accounts
        .route("/api/register", post(api::register))
        .route("/api/login", post(api::login))
        .route("/api/logout", post(api::logout))
        .route("/api/user", get(api::current_user))
        .route("/api/user/notifications", patch(api::update_notifications))
        // Drugs
        .route("/api/drugs", get(api::list_drugs).post(api::create_drug))
        .route(
            "/api/drugs/{id}",
            get(api::get_drug)
                .patch(api::update_drug)
                .delete(api::delete_drug),
        )
        // Reporting
        .route("/api/dashboard", get(api::dashboard))
        .route("/api/reports", get(api::reports))
        // Operations
        .route("/api/alerts/run", post(api::run_alerts))
        .layer(cors)
        .with_state(state)
}
