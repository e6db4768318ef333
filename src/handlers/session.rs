use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;
use crate::services::account::LoginOutcome;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub username: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// POST /login - Verify username + password and return the identity bundle
///
/// Response carries `mustChangePassword` so the client can force the
/// first-login password change, and the user's assigned reports resolved to
/// `{title, url}` entries. No session token is issued.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, ApiError> {
    let outcome = state.account.login(
        payload.username.as_deref().unwrap_or(""),
        payload.password.as_deref().unwrap_or(""),
    )?;
    Ok(Json(outcome))
}

/// POST /change-password - Set a new password and clear the forced-change flag
///
/// `oldPassword` is optional: the forced first-change flow omits it.
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    state.account.change_password(
        payload.username.as_deref().unwrap_or(""),
        payload.old_password.as_deref(),
        payload.new_password.as_deref().unwrap_or(""),
    )?;
    Ok(Json(json!({ "message": "Password updated" })))
}
