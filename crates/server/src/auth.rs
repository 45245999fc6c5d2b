//! Bearer token authentication.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use pharmatrack_core::Account;

use crate::api::{internal_error, unauthorized, ErrorResponse};
use crate::state::AppState;

/// The authenticated account behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account: Account,
    pub token: Uuid,
}

fn bearer_token(parts: &Parts) -> Option<Uuid> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| unauthorized("Not authenticated"))?;
        let account_id = state
            .sessions
            .resolve(&token)
            .await
            .ok_or_else(|| unauthorized("Session expired or invalid"))?;

        let account = state
            .repo
            .get_account(account_id)
            .await
            .map_err(internal_error)?
            .filter(|a| a.is_active)
            .ok_or_else(|| unauthorized("Not authenticated"))?;

        Ok(Self { account, token })
    }
}
