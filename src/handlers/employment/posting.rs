// handlers/employment/posting.rs - job posting CRUD
//
// GET    /api/employment?id=     detail (view-counted, optional caller)
// GET    /api/employment/list    open postings
// POST   /api/employment         create (multipart)
// PATCH  /api/employment/:id     update (multipart)
// DELETE /api/employment/:id     soft delete

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension,
};
use axum_extra::extract::Query as MultiQuery;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::format::{format_deadline, region_from_address, region_name};
use crate::api::multipart::MultipartForm;
use crate::api::validate::{int_list, parse_deadline, require_fields};
use crate::error::ApiError;
use crate::handlers::{discard_image, discard_on_error, require_author_or_admin, store_resized, today, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::employment_service::{EmploymentService, PostingInput};
use crate::services::UserService;
use crate::state::AppState;
use crate::storage::resize::JOB_POSTING_IMAGE;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingDetail {
    pub id: String,
    pub user_id: String,
    pub image: String,
    pub company_name: String,
    pub address_information: Value,
    pub title: String,
    pub content: String,
    pub position_id: i32,
    pub position_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_authority: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_applied: Option<bool>,
    pub region: String,
    pub deadline: String,
}

/// GET /api/employment?id= - posting detail
///
/// `hasAuthority` and `isApplied` are only present when true.
pub async fn detail(
    State(state): State<AppState>,
    caller: Option<Extension<AuthUser>>,
    Query(query): Query<IdQuery>,
) -> ApiResult<PostingDetail> {
    let id = query.require()?;
    let email = caller.map(|Extension(user)| user.email);

    let row = EmploymentService::new(state.pool.clone())
        .detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job posting not found"))?;

    let has_authority = match email.as_deref() {
        Some(email) if email == row.user_id => true,
        Some(email) => UserService::new(state.pool.clone()).is_admin(email).await?,
        None => false,
    };
    let is_applied = email
        .as_deref()
        .map(|email| row.applicant.as_ref().map(|list| list.0.iter().any(|a| a == email)).unwrap_or(false))
        .unwrap_or(false);

    let image = state.storage.object_url(&row.image).await?.unwrap_or_else(|| row.image.clone());

    Ok(ApiResponse::success(PostingDetail {
        region: region_from_address(&row.address_information.0),
        deadline: format_deadline(row.deadline),
        id: row.id,
        user_id: row.user_id,
        image,
        company_name: row.company_name,
        address_information: row.address_information.0,
        title: row.title,
        content: row.content,
        position_id: row.position_id,
        position_name: row.position_name,
        has_authority: has_authority.then_some(true),
        is_applied: is_applied.then_some(true),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub position: Vec<String>,
    /// Area codes, e.g. `02` for Seoul
    #[serde(default)]
    pub region: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub id: String,
    pub company_name: String,
    pub position: String,
    pub view_count: i32,
    pub region: String,
}

/// GET /api/employment/list?position=&region= - open postings in random order
pub async fn list(State(state): State<AppState>, MultiQuery(query): MultiQuery<ListQuery>) -> ApiResult<Value> {
    let positions = int_list(&query.position, "position")?;
    let regions: Vec<&str> = query.region.iter().filter_map(|code| region_name(code)).collect();
    if !query.region.is_empty() && regions.is_empty() {
        return Ok(ApiResponse::success(json!({ "jobPostingList": [] })));
    }

    let rows = EmploymentService::new(state.pool.clone())
        .list(&positions, &regions, today())
        .await?;

    let mut job_posting_list = Vec::with_capacity(rows.len());
    for row in rows {
        job_posting_list.push(PostingSummary {
            image: state.storage.object_url(&row.image).await?,
            region: region_from_address(&row.address_information.0),
            id: row.id,
            company_name: row.company_name,
            position: row.position,
            view_count: row.view_count,
        });
    }

    Ok(ApiResponse::success(json!({ "jobPostingList": job_posting_list })))
}

/// Validate the text parts shared by create and update
pub fn posting_input(form: &MultipartForm, today: NaiveDate) -> Result<PostingInput, ApiError> {
    require_fields(&[
        ("companyName", form.text("companyName")),
        ("title", form.text("title")),
        ("content", form.text("content")),
        ("address", form.text("address")),
        ("deadline", form.text("deadline")),
        ("positionId", form.text("positionId")),
    ])?;

    let address: Value = form.json("address")?.unwrap_or(Value::Null);
    if !address.is_object() {
        return Err(ApiError::bad_request("address must be a JSON object"));
    }
    let position_id = form
        .text("positionId")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::bad_request("positionId must be a number"))?;
    let deadline = parse_deadline(form.text("deadline").unwrap_or_default().trim(), today)?;

    Ok(PostingInput {
        company_name: form.text("companyName").unwrap_or_default().trim().to_string(),
        title: form.text("title").unwrap_or_default().trim().to_string(),
        content: form.text("content").unwrap_or_default().to_string(),
        address,
        deadline,
        position_id,
    })
}

fn posting_image_key() -> String {
    format!("employment/{}.jpg", Uuid::new_v4())
}

/// POST /api/employment - publish a posting with its cover image
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = MultipartForm::read(multipart).await?;
    let input = posting_input(&form, today())?;
    let image = form.file("image").ok_or_else(|| ApiError::missing_fields(&["image"]))?;

    let key = store_resized(state.storage.as_ref(), &posting_image_key(), image.bytes.clone(), JOB_POSTING_IMAGE).await?;

    let id = Uuid::new_v4().to_string();
    let created = EmploymentService::new(state.pool.clone()).create(&id, &user.email, &input, &key).await;
    discard_on_error(state.storage.as_ref(), Some(&key), created).await?;

    info!("Job posting {} created by {}", id, user.email);
    Ok(ApiResponse::created(json!({ "isPosted": true })))
}

/// PATCH /api/employment/:id - author or admin; a new image replaces the old one
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = MultipartForm::read(multipart).await?;
    let input = posting_input(&form, today())?;

    let service = EmploymentService::new(state.pool.clone());
    let owner = service
        .owner(&id)
        .await?
        .filter(|owner| !owner.is_deleted)
        .ok_or_else(|| ApiError::not_found("Job posting not found"))?;
    require_author_or_admin(&state, &user.email, &owner.user_id).await?;

    let new_image = match form.file("image") {
        Some(file) => Some(
            store_resized(state.storage.as_ref(), &posting_image_key(), file.bytes.clone(), JOB_POSTING_IMAGE).await?,
        ),
        None => None,
    };

    let updated = service.update(&id, &input, new_image.as_deref()).await;
    discard_on_error(state.storage.as_ref(), new_image.as_deref(), updated).await?;
    if new_image.is_some() {
        discard_image(state.storage.as_ref(), &owner.image).await;
    }

    Ok(ApiResponse::success(json!({ "isUpdated": true })))
}

/// DELETE /api/employment/:id - author or admin; the row is kept with `is_deleted`
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let service = EmploymentService::new(state.pool.clone());
    let owner = service
        .owner(&id)
        .await?
        .filter(|owner| !owner.is_deleted)
        .ok_or_else(|| ApiError::not_found("Job posting not found"))?;
    require_author_or_admin(&state, &user.email, &owner.user_id).await?;

    service.soft_delete(&id).await?;
    info!("Job posting {} deleted by {}", id, user.email);
    Ok(ApiResponse::success(json!({ "isDeleted": true })))
}
