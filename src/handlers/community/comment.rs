// handlers/community/comment.rs - comments on a board content
//
// GET    /api/community/comments?id=   list (optional caller)
// POST   /api/community/comment        write
// DELETE /api/community/comment/:id    soft delete; author or admin

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::view::describe_comments;
use crate::api::validate::require_fields;
use crate::error::ApiError;
use crate::handlers::{now, require_author_or_admin, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::CommunityService;
use crate::state::AppState;

/// GET /api/community/comments?id=
pub async fn comment_list(
    State(state): State<AppState>,
    caller: Option<Extension<AuthUser>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Value> {
    let id = query.require()?;
    let email = caller.map(|Extension(user)| user.email);

    let comments = describe_comments(&state, id, email.as_deref(), now()).await?;
    Ok(ApiResponse::success(json!({ "comments": comments })))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub id: Option<String>,
    pub content: Option<String>,
}

/// POST /api/community/comment - returns the content's comments as the caller sees them
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<Value> {
    require_fields(&[("id", body.id.as_deref()), ("content", body.content.as_deref())])?;
    let id = body.id.as_deref().unwrap_or_default();

    let service = CommunityService::new(state.pool.clone());
    service
        .content(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Content not found"))?;

    let now = now();
    service
        .add_comment(id, &user.email, body.content.as_deref().unwrap_or_default(), now)
        .await?;

    let comments = describe_comments(&state, id, Some(&user.email), now).await?;
    Ok(ApiResponse::created(json!({ "comments": comments })))
}

/// DELETE /api/community/comment/:id
pub async fn remove_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = CommunityService::new(state.pool.clone());
    let comment = service
        .comment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    require_author_or_admin(&state, &user.email, &comment.user_id).await?;

    service.soft_delete_comment(id).await?;
    info!("Comment {} deleted by {}", id, user.email);

    let comments = describe_comments(&state, &comment.board_content_id, Some(&user.email), now()).await?;
    Ok(ApiResponse::success(json!({
        "commentCount": comments.len(),
        "comments": comments,
    })))
}
