// handlers/auth/code.rs - POST /api/auth/code/email and POST /api/auth/email

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::validate::{is_valid_email, require_fields, required};
use crate::auth::code::generate_code;
use crate::config::config;
use crate::error::ApiError;
use crate::handlers::now;
use crate::mail::Mail;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::{code_is_fresh, UserService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub id: Option<String>,
    pub code: Option<String>,
}

/// POST /api/auth/code/email - mail a fresh verification code
///
/// Any unverified code previously issued for the address is discarded.
pub async fn send_code(State(state): State<AppState>, Json(body): Json<CodeRequest>) -> ApiResult<Value> {
    let email = required(&body.id, "id")?;
    if !is_valid_email(email) {
        return Err(ApiError::bad_request("Email address is not valid"));
    }

    let code = generate_code();
    UserService::new(state.pool.clone()).store_code(email, &code, now()).await?;
    state.mailer.send(Mail::verification_code(email, &code)).await?;

    info!("Verification code issued for {}", email);
    Ok(ApiResponse::created(json!({ "isAuth": true })))
}

/// POST /api/auth/email - confirm the mailed code
pub async fn verify_code(State(state): State<AppState>, Json(body): Json<VerifyRequest>) -> ApiResult<Value> {
    require_fields(&[("id", body.id.as_deref()), ("code", body.code.as_deref())])?;
    let email = required(&body.id, "id")?;
    let code = required(&body.code, "code")?;

    let users = UserService::new(state.pool.clone());
    let issued_at = users
        .pending_code_issued_at(email, code)
        .await?
        .ok_or_else(|| ApiError::conflict("Verification code does not match"))?;

    let now = now();
    if !code_is_fresh(issued_at, now, config().security.verification_code_minutes) {
        return Err(ApiError::conflict("Verification code has expired"));
    }

    users.mark_code_verified(email, code, now).await?;
    Ok(ApiResponse::success(json!({ "isAuth": true })))
}
