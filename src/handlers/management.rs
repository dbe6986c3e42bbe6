// handlers/management.rs - /api/management admin console
//
// POST   /api/management/banner        upload bannerImage0..4
// GET    /api/management/banner
// DELETE /api/management/banner/:id
// GET    /api/management/student?uniId=&name=
// PATCH  /api/management/student
// GET    /api/management/admin/list
// DELETE /api/management/admin/:id     supervisor only

use axum::{
    extract::{Multipart, Path, Query, State},
    middleware::from_fn,
    routing::{delete, get},
    Extension, Json, Router,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::multipart::{MultipartForm, UploadedFile};
use crate::api::validate::require_fields;
use crate::config::config;
use crate::database::models::Banner;
use crate::error::ApiError;
use crate::handlers::{content_type_of, discard_image, image_url, require_admin};
use crate::middleware::{require_access, ApiResponse, ApiResult, AuthUser};
use crate::services::banner_service::{banner_key, exceeds_limit, MAX_BANNERS};
use crate::services::{BannerService, UserService};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/banner", get(banner_list).post(upload_banners))
        .route("/banner/:id", delete(delete_banner))
        .route("/student", get(search_students).patch(update_student))
        .route("/admin/list", get(admin_list))
        .route("/admin/:id", delete(delete_admin))
        .route_layer(from_fn(require_access))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerInfo {
    pub file_name: String,
    pub image: Option<String>,
    pub key: String,
}

async fn banner_infos(state: &AppState) -> Result<Vec<BannerInfo>, ApiError> {
    let banners = BannerService::new(state.pool.clone()).list().await?;
    let storage = state.storage.as_ref();
    try_join_all(banners.into_iter().map(|banner| async move {
        let image = image_url(storage, Some(&banner.object_key())).await?;
        Ok::<_, ApiError>(BannerInfo { file_name: banner.name, image, key: banner.id })
    }))
    .await
}

/// Files sent as `bannerImage0` .. `bannerImage4`, in slot order
pub fn banner_files(form: &MultipartForm) -> Vec<&UploadedFile> {
    (0..MAX_BANNERS)
        .filter_map(|slot| form.file(&format!("bannerImage{}", slot)))
        .collect()
}

/// POST /api/management/banner
pub async fn upload_banners(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Value> {
    require_admin(&state, &user.email).await?;
    let form = MultipartForm::read(multipart).await?;
    let files = banner_files(&form);

    let service = BannerService::new(state.pool.clone());
    if exceeds_limit(service.count().await?, files.len()) {
        return Err(ApiError::bad_request(format!("At most {} banners can be registered", MAX_BANNERS)));
    }

    for file in files {
        let key = banner_key(&Uuid::new_v4().to_string(), &file.file_name);
        let content_type = content_type_of(&file.file_name);
        state
            .storage
            .upload(&Banner::key_for(&key), file.bytes.clone(), content_type)
            .await?;
        service.insert(&key, &file.file_name).await?;
        info!("Banner {} uploaded by {}", key, user.email);
    }

    Ok(ApiResponse::success(json!({ "bannerList": banner_infos(&state).await? })))
}

/// GET /api/management/banner
pub async fn banner_list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    require_admin(&state, &user.email).await?;
    Ok(ApiResponse::success(json!({ "bannerList": banner_infos(&state).await? })))
}

/// DELETE /api/management/banner/:id
pub async fn delete_banner(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&state, &user.email).await?;

    if BannerService::new(state.pool.clone()).delete(&id).await? {
        discard_image(state.storage.as_ref(), &Banner::key_for(&id)).await;
        info!("Banner {} deleted by {}", id, user.email);
    }

    Ok(ApiResponse::success(json!({ "bannerList": banner_infos(&state).await? })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    pub uni_id: Option<String>,
    pub name: Option<String>,
}

/// GET /api/management/student?uniId=&name= - either field matches
pub async fn search_students(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StudentQuery>,
) -> ApiResult<Value> {
    let uni_id = query.uni_id.as_deref().filter(|s| !s.trim().is_empty());
    let name = query.name.as_deref().filter(|s| !s.trim().is_empty());
    if uni_id.is_none() && name.is_none() {
        return Err(ApiError::bad_request("uniId or name is required"));
    }
    require_admin(&state, &user.email).await?;

    let student_list = UserService::new(state.pool.clone()).search_students(uni_id, name).await?;
    Ok(ApiResponse::success(json!({ "studentList": student_list })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
    pub id: Option<String>,
    pub uni_id: Option<String>,
    pub name: Option<String>,
}

/// PATCH /api/management/student
pub async fn update_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<StudentUpdate>,
) -> ApiResult<Value> {
    require_fields(&[
        ("id", body.id.as_deref()),
        ("uniId", body.uni_id.as_deref()),
        ("name", body.name.as_deref()),
    ])?;
    require_admin(&state, &user.email).await?;

    let id = body.id.as_deref().unwrap_or_default();
    let service = UserService::new(state.pool.clone());
    let updated = service
        .update_student_info(
            id,
            body.uni_id.as_deref().unwrap_or_default().trim(),
            body.name.as_deref().unwrap_or_default().trim(),
        )
        .await?;
    if !updated {
        return Err(ApiError::not_found("User not found"));
    }

    info!("Student info of {} updated by {}", id, user.email);
    Ok(ApiResponse::success(json!({ "studentList": service.student_summary(id).await? })))
}

/// GET /api/management/admin/list
pub async fn admin_list(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    require_admin(&state, &user.email).await?;
    let admin_list = UserService::new(state.pool.clone())
        .admins_except(&config().security.supervisor_id)
        .await?;
    Ok(ApiResponse::success(json!({ "adminList": admin_list })))
}

/// True only for the configured supervisor account
pub fn is_supervisor(email: &str, supervisor_id: &str) -> bool {
    !supervisor_id.is_empty() && email == supervisor_id
}

/// DELETE /api/management/admin/:id
pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let supervisor_id = &config().security.supervisor_id;
    if !is_supervisor(&user.email, supervisor_id) {
        warn!("Admin deletion refused for {}", user.email);
        return Err(ApiError::forbidden("Only the supervisor may delete admins"));
    }
    if id == *supervisor_id {
        return Err(ApiError::bad_request("The supervisor account cannot be deleted"));
    }

    let service = UserService::new(state.pool.clone());
    if !service.delete_admin(&id).await? {
        return Err(ApiError::not_found("Admin account not found"));
    }
    info!("Admin {} deleted by supervisor", id);

    Ok(ApiResponse::success(json!({ "adminList": service.admins_except(supervisor_id).await? })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(field: &str, name: &str) -> UploadedFile {
        UploadedFile { field: field.into(), file_name: name.into(), bytes: vec![0] }
    }

    #[test]
    fn only_numbered_slots_are_banners() {
        let mut form = MultipartForm::default();
        form.files.push(file("bannerImage3", "c.png"));
        form.files.push(file("bannerImage0", "a.png"));
        form.files.push(file("bannerImage5", "ignored.png"));
        form.files.push(file("poster", "ignored.png"));

        let names: Vec<&str> = banner_files(&form).iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
    }

    #[test]
    fn supervisor_must_be_configured() {
        assert!(is_supervisor("boss@x.com", "boss@x.com"));
        assert!(!is_supervisor("admin@x.com", "boss@x.com"));
        assert!(!is_supervisor("", ""));
    }
}
