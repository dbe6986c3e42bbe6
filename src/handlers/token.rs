// handlers/token.rs - POST /api/token/refreshToken handler

use axum::{extract::State, middleware::from_fn, routing::post, Extension, Router};
use serde_json::{json, Value};
use tracing::warn;

use crate::auth::{issue, TokenKind};
use crate::error::ApiError;
use crate::middleware::{require_refresh, ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/refreshToken", post(refresh))
        .route_layer(from_fn(require_refresh))
}

/// POST /api/token/refreshToken - new access token for a refresh token holder
pub async fn refresh(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    if UserService::new(state.pool.clone()).find(&user.email).await?.is_none() {
        warn!("Refresh token presented for unknown account {}", user.email);
        return Err(ApiError::unauthorized("Account no longer exists"));
    }

    let access_token = issue(TokenKind::Access, &user.email)?;
    Ok(ApiResponse::success(json!({
        "accessToken": access_token,
        "email": user.email,
    })))
}
