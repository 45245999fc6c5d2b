use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use pharmatrack_core::Account;

use crate::auth::AuthUser;
use crate::state::AppState;

use super::{internal_error, not_found, ApiResult};

#[derive(Debug, Deserialize)]
pub struct NotificationSettings {
    pub email_notifications: bool,
}

/// Opt the current user in or out of expiration emails.
pub async fn update_notifications(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NotificationSettings>,
) -> ApiResult<Json<Account>> {
    let account = state
        .repo
        .set_email_notifications(auth.account.id, req.email_notifications)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("User", auth.account.id))?;
    Ok(Json(account))
}
