//! Registration, login and session endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use pharmatrack_core::password::verify_password;
use pharmatrack_core::{Account, NewAccount};

use crate::accounts::{create_account, CreateAccountError};
use crate::auth::AuthUser;
use crate::state::AppState;

use super::{bad_request, internal_error, storage_error, unauthorized, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: Account,
    pub token: Uuid,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewAccount>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let user = create_account(state.repo.as_ref(), req)
        .await
        .map_err(|e| match e {
            CreateAccountError::Invalid(e) => bad_request(e.to_string()),
            CreateAccountError::Storage(e) => storage_error(e),
            CreateAccountError::Hashing(e) => internal_error(e),
        })?;
    let token = state.sessions.create(user.id).await;
    info!(user_id = user.id, role = %user.role, "account registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state
        .repo
        .get_account_by_username(req.username.trim())
        .await
        .map_err(internal_error)?
        .filter(|a| a.is_active && verify_password(&req.password, &a.password_hash))
        .ok_or_else(|| unauthorized("Invalid username or password"))?;

    let token = state.sessions.create(user.id).await;
    info!(user_id = user.id, "login");
    Ok(Json(AuthResponse { user, token }))
}

pub async fn logout(State(state): State<Arc<AppState>>, auth: AuthUser) -> StatusCode {
    state.sessions.revoke(&auth.token).await;
    StatusCode::NO_CONTENT
}

pub async fn current_user(auth: AuthUser) -> Json<Account> {
    Json(auth.account)
}
