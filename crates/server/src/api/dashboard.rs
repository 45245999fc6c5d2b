//! Dashboard and analytics endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use pharmatrack_core::report::{self, DashboardSummary, InventoryReport};

use crate::auth::AuthUser;
use crate::state::AppState;

use super::{internal_error, ApiResult};

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> ApiResult<Json<DashboardSummary>> {
    let drugs = state.repo.list_drugs().await.map_err(internal_error)?;
    Ok(Json(report::dashboard(&drugs, Utc::now())))
}

pub async fn reports(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> ApiResult<Json<InventoryReport>> {
    let drugs = state.repo.list_drugs().await.map_err(internal_error)?;
    Ok(Json(report::inventory_report(&drugs, Utc::now())))
}
