use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AdminClaim, AppState};
use crate::error::ApiError;
use crate::store::users::{SafeUser, UserPatch};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub admin_username: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub reports: Option<Vec<String>>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub admin_username: Option<String>,
    pub password: Option<String>,
    pub reports: Option<Vec<String>>,
    pub must_change_password: Option<bool>,
    pub is_admin: Option<bool>,
}

/// GET /users - All users as safe views (no password hashes)
pub async fn list(State(state): State<AppState>) -> Json<Vec<SafeUser>> {
    Json(state.account.list_users())
}

/// POST /users - Create a user (admin). Password defaults when omitted and
/// the account starts with `mustChangePassword` set.
pub async fn create(
    State(state): State<AppState>,
    Query(claim): Query<AdminClaim>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let claimed = AdminClaim::merged(payload.admin_username.as_deref(), &claim);
    let user = state
        .account
        .create_user(
            claimed,
            payload.username.as_deref().unwrap_or(""),
            payload.password.as_deref(),
            payload.reports.unwrap_or_default(),
            payload.is_admin.unwrap_or(false),
        )
        .await?;
    Ok(Json(json!({ "message": "User created", "user": user })))
}

/// PUT /users/:username - Merge-if-provided update (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(claim): Query<AdminClaim>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let claimed = AdminClaim::merged(payload.admin_username.as_deref(), &claim);
    let patch = UserPatch {
        // An empty password field means "leave it alone", not "set empty"
        password: payload.password.filter(|p| !p.is_empty()),
        reports: payload.reports,
        must_change_password: payload.must_change_password,
        is_admin: payload.is_admin,
    };
    let user = state.account.update_user(claimed, &username, patch).await?;
    Ok(Json(json!({ "message": "User updated", "user": user })))
}

/// DELETE /users/:username - Remove a user (admin). The claim may arrive in
/// the body or the query string; the body is optional for clients that send
/// bare DELETEs.
pub async fn remove(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(claim): Query<AdminClaim>,
    payload: Option<Json<AdminClaim>>,
) -> Result<Json<Value>, ApiError> {
    let body_claim = payload.as_ref().and_then(|p| p.admin_username.as_deref());
    let claimed = AdminClaim::merged(body_claim, &claim);
    state.account.delete_user(claimed, &username).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}
