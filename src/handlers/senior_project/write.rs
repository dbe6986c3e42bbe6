// handlers/senior_project/write.rs - admin edits of the showcase
//
// POST   /api/senior-project                 register a project (multipart)
// PATCH  /api/senior-project                 edit; new members are added
// DELETE /api/senior-project/:id             project, members and their files
// DELETE /api/senior-project/member/:uniId   one member

use axum::{
    extract::{Multipart, Path, State},
    Extension,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::form::{design_key, member_image_key, member_images, project_form, DESIGN_FIELD};
use crate::api::multipart::MultipartForm;
use crate::error::ApiError;
use crate::handlers::{content_type_of, discard_image, require_admin, store_resized};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::senior_project_service::{MemberInput, ProjectInput};
use crate::services::SeniorProjectService;
use crate::state::AppState;
use crate::storage::resize::PROJECT_MEMBER_IMAGE;

/// Upload the design file and member images; returns every stored key
async fn store_files(
    state: &AppState,
    form: &MultipartForm,
    project: &mut ProjectInput,
    members: &mut [MemberInput],
) -> Result<Vec<String>, ApiError> {
    let images = member_images(form, members.len())?;
    let mut stored = Vec::new();

    if let Some(file) = form.file(DESIGN_FIELD) {
        let key = design_key(&project.year, &project.group_name, &file.file_name);
        let key = state
            .storage
            .upload(&key, file.bytes.clone(), content_type_of(&file.file_name))
            .await?;
        project.project_design = Some(key.clone());
        stored.push(key);
    }

    for (slot, file) in images {
        let key = member_image_key(&project.year, &project.group_name, &members[slot].name);
        match store_resized(state.storage.as_ref(), &key, file.bytes.clone(), PROJECT_MEMBER_IMAGE).await {
            Ok(key) => {
                members[slot].image = Some(key.clone());
                stored.push(key);
            }
            Err(e) => {
                discard_all(state, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

async fn discard_all(state: &AppState, keys: &[String]) {
    for key in keys {
        discard_image(state.storage.as_ref(), key).await;
    }
}

/// POST /api/senior-project
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = MultipartForm::read(multipart).await?;
    let (mut project, mut members) = project_form(&form)?;
    require_admin(&state, &user.email).await?;

    let service = SeniorProjectService::new(state.pool.clone());
    if service.group_exists(&project.year, project.class_id, &project.group_name, None).await? {
        return Err(ApiError::bad_request(format!("{} is already a registered group name", project.group_name)));
    }
    let uni_ids: Vec<String> = members.iter().map(|m| m.uni_id.clone()).collect();
    let registered = service.registered_members(&uni_ids).await?;
    if !registered.is_empty() {
        return Err(ApiError::bad_request(format!("{} already registered", registered.join(", "))));
    }

    let stored = store_files(&state, &form, &mut project, &mut members).await?;
    let id = Uuid::new_v4().to_string();
    if let Err(e) = service.create(&id, &project, &members).await {
        discard_all(&state, &stored).await;
        return Err(e.into());
    }

    info!("Senior project {} ({}) registered by {}", id, project.group_name, user.email);
    Ok(ApiResponse::created(json!({ "isPosted": true })))
}

/// PATCH /api/senior-project - a missing design file keeps the current one
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = MultipartForm::read(multipart).await?;
    let id = form
        .text("id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::missing_fields(&["id"]))?;
    let (mut project, mut members) = project_form(&form)?;
    require_admin(&state, &user.email).await?;

    let service = SeniorProjectService::new(state.pool.clone());
    let current = service
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Senior project not found"))?;
    if service
        .group_exists(&project.year, project.class_id, &project.group_name, Some(&id))
        .await?
    {
        return Err(ApiError::bad_request(format!("{} is already a registered group name", project.group_name)));
    }

    let stored = store_files(&state, &form, &mut project, &mut members).await?;
    if let Err(e) = service.update(&id, &project, &members).await {
        discard_all(&state, &stored).await;
        return Err(e.into());
    }

    if let (Some(old), Some(new)) = (current.project_design.as_deref(), project.project_design.as_deref()) {
        if old != new {
            discard_image(state.storage.as_ref(), old).await;
        }
    }

    info!("Senior project {} updated by {}", id, user.email);
    Ok(ApiResponse::success(json!({ "isUpdated": true })))
}

/// DELETE /api/senior-project/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&state, &user.email).await?;

    let service = SeniorProjectService::new(state.pool.clone());
    let project = service
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Senior project not found"))?;
    let members = service.members(&id).await?;

    service.delete(&id).await?;

    let keys: Vec<String> = members
        .into_iter()
        .filter_map(|member| member.profile_image)
        .chain(project.project_design)
        .collect();
    discard_all(&state, &keys).await;

    info!("Senior project {} deleted by {}", id, user.email);
    Ok(ApiResponse::success(json!({ "isDeleted": true })))
}

/// DELETE /api/senior-project/member/:uniId
pub async fn delete_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(uni_id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&state, &user.email).await?;

    let service = SeniorProjectService::new(state.pool.clone());
    let member = service
        .member(&uni_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team member not found"))?;

    service.delete_member(&uni_id).await?;
    if let Some(key) = member.profile_image.as_deref() {
        discard_image(state.storage.as_ref(), key).await;
    }

    info!("Team member {} removed by {}", uni_id, user.email);
    Ok(ApiResponse::success(json!({ "isDeleted": true })))
}
