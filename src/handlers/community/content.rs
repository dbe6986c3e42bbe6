// handlers/community/content.rs - board contents and likes
//
// GET    /api/community?id=                     detail (view-counted, optional caller)
// GET    /api/community/list?categoryId=&page=  one page, newest first
// GET    /api/community/best-pick?categoryId=   top three since yesterday
// POST   /api/community                         write
// PATCH  /api/community                         edit
// DELETE /api/community/:id                     soft delete
// PATCH  /api/community/like/:id                toggle the caller's like

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::view::{content_view, describe_content, ContentView};
use crate::api::validate::{int_value, require_fields, required};
use crate::error::ApiError;
use crate::handlers::{image_url, now, require_author_or_admin, today, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::community_service::{best_pick as pick_best, page_offset, MAX_PAGE, PAGE_LIMIT};
use crate::services::CommunityService;
use crate::state::AppState;

fn not_found() -> ApiError {
    ApiError::not_found("Content not found")
}

/// `categoryId` as a number, 400 otherwise
fn category_id(raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = raw.filter(|s| !s.trim().is_empty()).ok_or_else(|| ApiError::missing_fields(&["categoryId"]))?;
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request("categoryId must be a number"))
}

/// Validated `page`; pages start at 1
pub fn page_number(raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = raw.filter(|s| !s.trim().is_empty()).ok_or_else(|| ApiError::missing_fields(&["page"]))?;
    match raw.trim().parse::<i64>() {
        Ok(page) if page > MAX_PAGE => Err(ApiError::bad_request("page is out of range")),
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(ApiError::bad_request("page must be a positive number")),
    }
}

/// Page number to ask for next, or -1 when nothing follows
pub fn next_page(page: i64, has_more: bool) -> i64 {
    if has_more {
        page + 1
    } else {
        -1
    }
}

/// GET /api/community?id=
pub async fn detail(
    State(state): State<AppState>,
    caller: Option<Extension<AuthUser>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Value> {
    let id = query.require()?;
    let email = caller.map(|Extension(user)| user.email);

    let row = CommunityService::new(state.pool.clone())
        .content(id)
        .await?
        .ok_or_else(not_found)?;
    let content = describe_content(&state, row, email.as_deref(), now()).await?;

    Ok(ApiResponse::success(json!({ "content": content })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category_id: Option<String>,
    pub page: Option<String>,
}

/// GET /api/community/list?categoryId=&page=
pub async fn list(
    State(state): State<AppState>,
    caller: Option<Extension<AuthUser>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    require_fields(&[("categoryId", query.category_id.as_deref()), ("page", query.page.as_deref())])?;
    let category = category_id(query.category_id.as_deref())?;
    let page = page_number(query.page.as_deref())?;
    let email = caller.map(|Extension(user)| user.email);

    let service = CommunityService::new(state.pool.clone());
    let rows = service.page(category, page_offset(page)).await?;
    let has_more = service.has_rows_from(category, page * PAGE_LIMIT).await?;

    let now = now();
    let mut content_list = Vec::with_capacity(rows.len());
    for row in rows {
        let mut view = describe_content(&state, row, email.as_deref(), now).await?;
        view.category_id = None;
        content_list.push(view);
    }

    Ok(ApiResponse::success(json!({
        "contentList": content_list,
        "page": next_page(page, has_more),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub category_id: Option<String>,
}

/// GET /api/community/best-pick?categoryId=
pub async fn best_pick(State(state): State<AppState>, Query(query): Query<CategoryQuery>) -> ApiResult<Value> {
    let category = category_id(query.category_id.as_deref())?;
    let since = today() - Duration::days(1);

    let service = CommunityService::new(state.pool.clone());
    let rows = service.uploaded_since(category, since).await?;
    let mut scored = Vec::with_capacity(rows.len());
    for row in rows {
        let engagement = service.engagement(&row.id).await?;
        scored.push((row, engagement));
    }

    let now = now();
    let mut picked: Vec<ContentView> = Vec::new();
    for (row, engagement) in pick_best(scored) {
        let image = image_url(state.storage.as_ref(), row.profile_image.as_deref()).await?;
        let mut view = content_view(row, engagement, now);
        view.category_id = None;
        view.profile_image_url = image;
        picked.push(view);
    }

    Ok(ApiResponse::success(json!({ "content": picked })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub category_id: Option<Value>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// POST /api/community
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateRequest>,
) -> ApiResult<Value> {
    let category = int_value(body.category_id.as_ref());
    if body.category_id.is_none() {
        return Err(ApiError::missing_fields(&["categoryId"]));
    }
    let category = category.ok_or_else(|| ApiError::bad_request("categoryId must be a number"))?;
    let title = required(&body.title, "title")?;
    let content = required(&body.content, "content")?;

    let id = Uuid::new_v4().to_string();
    CommunityService::new(state.pool.clone())
        .create(&id, &user.email, category, title.trim(), content, now())
        .await?;

    info!("Content {} posted by {} in category {}", id, user.email, category);
    Ok(ApiResponse::created(json!({ "isPosted": true })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// PATCH /api/community - author or admin
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Value> {
    require_fields(&[
        ("id", body.id.as_deref()),
        ("title", body.title.as_deref()),
        ("content", body.content.as_deref()),
    ])?;
    let id = body.id.as_deref().unwrap_or_default();

    let service = CommunityService::new(state.pool.clone());
    let row = service.content(id).await?.ok_or_else(not_found)?;
    require_author_or_admin(&state, &user.email, &row.user_id).await?;

    service
        .update(id, body.title.as_deref().unwrap_or_default().trim(), body.content.as_deref().unwrap_or_default())
        .await?;
    Ok(ApiResponse::success(json!({ "isUpdated": true })))
}

/// DELETE /api/community/:id - author or admin
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let service = CommunityService::new(state.pool.clone());
    let row = service.content(&id).await?.ok_or_else(not_found)?;
    require_author_or_admin(&state, &user.email, &row.user_id).await?;

    service.soft_delete(&id).await?;
    info!("Content {} deleted by {}", id, user.email);
    Ok(ApiResponse::success(json!({ "isDeleted": true })))
}

/// PATCH /api/community/like/:id
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let service = CommunityService::new(state.pool.clone());
    service.content(&id).await?.ok_or_else(not_found)?;

    let (is_liked, like_count) = service.toggle_like(&id, &user.email, now()).await?;
    Ok(ApiResponse::success(json!({ "isLiked": is_liked, "likeCount": like_count })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_must_be_positive() {
        assert_eq!(page_number(Some("1")).unwrap(), 1);
        assert_eq!(page_number(Some(" 4 ")).unwrap(), 4);
        assert_eq!(page_number(Some("0")).unwrap_err().status_code(), 400);
        assert_eq!(page_number(Some("-2")).unwrap_err().status_code(), 400);
        assert_eq!(page_number(Some("two")).unwrap_err().status_code(), 400);
        assert_eq!(page_number(None).unwrap_err().status_code(), 400);
    }

    #[test]
    fn page_is_capped_before_offsets_overflow() {
        assert_eq!(page_number(Some("9223372036854775807")).unwrap_err().status_code(), 400);
        let last = page_number(Some(&MAX_PAGE.to_string())).unwrap();
        assert_eq!(last * PAGE_LIMIT - page_offset(last), PAGE_LIMIT);
    }

    #[test]
    fn last_page_reports_minus_one() {
        assert_eq!(next_page(1, true), 2);
        assert_eq!(next_page(3, false), -1);
    }

    #[test]
    fn category_must_be_numeric() {
        assert_eq!(category_id(Some("2")).unwrap(), 2);
        assert_eq!(category_id(Some("free")).unwrap_err().status_code(), 400);
        assert_eq!(category_id(Some("")).unwrap_err().status_code(), 400);
    }
}
