// handlers/help.rs - POST /api/help/password handler

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::validate::{is_valid_email, require_fields, required};
use crate::auth::password::{hash_password, verify_password};
use crate::config::config;
use crate::error::ApiError;
use crate::handlers::now;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::{code_is_fresh, UserService};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/password", post(reset_password))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub id: Option<String>,
    pub password: Option<String>,
    pub verify_password: Option<String>,
}

/// POST /api/help/password - set a new password after email verification
///
/// The address must have completed `/api/auth/email` within the reset window.
pub async fn reset_password(State(state): State<AppState>, Json(body): Json<ResetPasswordRequest>) -> ApiResult<Value> {
    require_fields(&[
        ("id", body.id.as_deref()),
        ("password", body.password.as_deref()),
        ("verifyPassword", body.verify_password.as_deref()),
    ])?;
    let id = required(&body.id, "id")?;
    let password = required(&body.password, "password")?;

    if !is_valid_email(id) {
        return Err(ApiError::bad_request("Email address is not valid"));
    }
    if Some(password) != body.verify_password.as_deref().map(str::trim) {
        return Err(ApiError::bad_request("Passwords do not match"));
    }

    let users = UserService::new(state.pool.clone());
    let user = users
        .find(id)
        .await?
        .ok_or_else(|| ApiError::forbidden("Account is not registered"))?;

    let window = config().security.password_reset_minutes;
    let verified_recently = users
        .last_verified_at(id)
        .await?
        .map(|verified| code_is_fresh(verified, now(), window))
        .unwrap_or(false);
    if !verified_recently {
        return Err(ApiError::forbidden("Email verification is required"));
    }

    if verify_password(password, &user.password) {
        return Err(ApiError::conflict("New password must differ from the current one"));
    }

    users.update_password(id, &hash_password(password)).await?;
    info!("Password reset for {}", id);
    Ok(ApiResponse::success(json!({ "isSucceeded": true })))
}
