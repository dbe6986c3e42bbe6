// handlers/auth/login.rs - POST /api/auth/login handler

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::validate::{require_fields, required};
use crate::auth::{issue, password::hash_password, TokenKind};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id: Option<String>,
    pub password: Option<String>,
}

/**
 * POST /api/auth/login - exchange credentials for a token pair
 *
 * Output:
 * ```json
 * { "refreshToken": "...", "accessToken": "...", "email": "a@b.com", "nickname": "kim", "isAdmin": false }
 * ```
 *
 * Unknown id and wrong password both answer 400 with the same message.
 */
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> ApiResult<Value> {
    require_fields(&[("id", body.id.as_deref()), ("password", body.password.as_deref())])?;
    let id = required(&body.id, "id")?;
    let password = required(&body.password, "password")?;

    let Some(user) = UserService::new(state.pool.clone())
        .find_by_credentials(id, &hash_password(password))
        .await?
    else {
        warn!("Failed login for {}", id);
        return Err(ApiError::bad_request("Id or password is incorrect"));
    };

    let refresh_token = issue(TokenKind::Refresh, id)?;
    let access_token = issue(TokenKind::Access, id)?;

    info!("User {} logged in", id);
    Ok(ApiResponse::success(json!({
        "refreshToken": refresh_token,
        "accessToken": access_token,
        "email": user.id,
        "nickname": user.nickname,
        "isAdmin": user.is_admin,
    })))
}
