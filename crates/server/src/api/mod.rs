//! Domain-focused API endpoint modules.
//!
//! Each sub-module owns a single responsibility area.
//! Shared error types and helpers live here in mod.rs.

mod accounts;
mod alerts;
mod dashboard;
mod drugs;
mod health;
mod user;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use pharmatrack_storage::StorageError;

pub use accounts::{current_user, login, logout, register};
pub use alerts::run_alerts;
pub use dashboard::{dashboard, reports};
pub use drugs::{create_drug, delete_drug, get_drug, list_drugs, update_drug};
pub use health::health;
pub use user::update_notifications;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) type ApiResult<T> = Result<T, ApiError>;

// ── Helpers ─────────────────────────────────────────────────────

fn error_response(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: msg.into() }))
}

pub(crate) fn bad_request(msg: impl Into<String>) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, msg)
}

pub(crate) fn unauthorized(msg: impl Into<String>) -> ApiError {
    error_response(StatusCode::UNAUTHORIZED, msg)
}

pub(crate) fn forbidden(msg: impl Into<String>) -> ApiError {
    error_response(StatusCode::FORBIDDEN, msg)
}

pub(crate) fn not_found(resource: &str, id: impl std::fmt::Display) -> ApiError {
    error_response(StatusCode::NOT_FOUND, format!("{} not found: {}", resource, id))
}

pub(crate) fn internal_error(e: impl std::fmt::Display) -> ApiError {
    error!("request failed: {}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Duplicates are the caller's fault; anything else is ours.
pub(crate) fn storage_error(e: StorageError) -> ApiError {
    match e {
        StorageError::Duplicate { .. } => bad_request(e.to_string()),
        other => internal_error(other),
    }
}
