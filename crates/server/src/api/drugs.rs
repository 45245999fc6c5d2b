//! Drug CRUD endpoints.
//!
//! Every drug in a response carries its current risk bucket and day count,
//! both null when the stored date cannot be parsed.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use pharmatrack_core::{Drug, DrugId, DrugPatch, NewDrug, RiskBucket};

use crate::auth::AuthUser;
use crate::state::AppState;

use super::{bad_request, forbidden, internal_error, not_found, ApiResult};

#[derive(Debug, Serialize)]
pub struct DrugView {
    #[serde(flatten)]
    pub drug: Drug,
    pub risk: Option<RiskBucket>,
    pub days_until_expiry: Option<i64>,
}

impl DrugView {
    fn new(drug: Drug, now: DateTime<Utc>) -> Self {
        let days_until_expiry = drug.days_until_expiry(now).ok();
        Self {
            risk: days_until_expiry.map(RiskBucket::from_days),
            days_until_expiry,
            drug,
        }
    }
}

pub async fn list_drugs(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<DrugView>>> {
    let now = Utc::now();
    let drugs = state.repo.list_drugs().await.map_err(internal_error)?;
    Ok(Json(drugs.into_iter().map(|d| DrugView::new(d, now)).collect()))
}

pub async fn get_drug(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<DrugId>,
) -> ApiResult<Json<DrugView>> {
    let drug = state
        .repo
        .get_drug(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Drug", id))?;
    Ok(Json(DrugView::new(drug, Utc::now())))
}

pub async fn create_drug(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewDrug>,
) -> ApiResult<(StatusCode, Json<DrugView>)> {
    if !auth.account.role.can_edit_drugs() {
        return Err(forbidden("Insufficient permissions"));
    }
    req.validate().map_err(|e| bad_request(e.to_string()))?;

    let drug = state.repo.create_drug(req).await.map_err(internal_error)?;
    info!(drug_id = drug.id, user_id = auth.account.id, "drug created");
    Ok((StatusCode::CREATED, Json(DrugView::new(drug, Utc::now()))))
}

pub async fn update_drug(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<DrugId>,
    Json(patch): Json<DrugPatch>,
) -> ApiResult<Json<DrugView>> {
    if !auth.account.role.can_edit_drugs() {
        return Err(forbidden("Insufficient permissions"));
    }
    patch.validate().map_err(|e| bad_request(e.to_string()))?;

    let drug = state
        .repo
        .update_drug(id, patch)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Drug", id))?;
    info!(drug_id = id, user_id = auth.account.id, "drug updated");
    Ok(Json(DrugView::new(drug, Utc::now())))
}

pub async fn delete_drug(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<DrugId>,
) -> ApiResult<StatusCode> {
    if !auth.account.role.can_delete_drugs() {
        return Err(forbidden("Insufficient permissions"));
    }
    if !state.repo.delete_drug(id).await.map_err(internal_error)? {
        return Err(not_found("Drug", id));
    }
    info!(drug_id = id, user_id = auth.account.id, "drug deleted");
    Ok(StatusCode::NO_CONTENT)
}
