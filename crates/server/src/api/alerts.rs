use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use tracing::info;

use pharmatrack_alerts::TickReport;

use crate::auth::AuthUser;
use crate::state::AppState;

use super::{forbidden, internal_error, ApiResult};

/// Run one alert tick now, outside the regular schedule.
pub async fn run_alerts(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<TickReport>> {
    if !auth.account.role.can_run_alerts() {
        return Err(forbidden("Insufficient permissions"));
    }
    info!(user_id = auth.account.id, "manual alert run requested");
    let report = state
        .scheduler
        .tick(Utc::now())
        .await
        .map_err(internal_error)?;
    Ok(Json(report))
}
