use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{AdminClaim, AppState};
use crate::error::ApiError;
use crate::store::reports::ReportEntry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReportRequest {
    pub admin_username: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// GET /reports - The whole catalog as an id -> {title, url} mapping.
/// Unauthenticated read; entries carry no secrets.
pub async fn list(State(state): State<AppState>) -> Json<BTreeMap<String, ReportEntry>> {
    Json(state.catalog.list())
}

/// POST /reports - Create or overwrite a catalog entry (admin). Create and
/// update are the same operation, keyed by id.
pub async fn upsert(
    State(state): State<AppState>,
    Query(claim): Query<AdminClaim>,
    Json(payload): Json<UpsertReportRequest>,
) -> Result<Json<Value>, ApiError> {
    let claimed = AdminClaim::merged(payload.admin_username.as_deref(), &claim);
    let report = state
        .catalog
        .upsert(
            claimed,
            payload.id.as_deref().unwrap_or(""),
            payload.title.as_deref().unwrap_or(""),
            payload.url.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(Json(json!({ "message": "Report saved", "report": report })))
}

/// DELETE /reports/:id - Remove a catalog entry (admin). Users keeping the
/// id in their assignment list simply stop seeing it at login.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(claim): Query<AdminClaim>,
    payload: Option<Json<AdminClaim>>,
) -> Result<Json<Value>, ApiError> {
    let body_claim = payload.as_ref().and_then(|p| p.admin_username.as_deref());
    let claimed = AdminClaim::merged(body_claim, &claim);
    state.catalog.delete(claimed, &id).await?;
    Ok(Json(json!({ "message": "Report deleted" })))
}
