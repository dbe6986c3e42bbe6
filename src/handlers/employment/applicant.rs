// handlers/employment/applicant.rs - applications to a job posting
//
// GET    /api/employment/applicant/list?id=
// POST   /api/employment/applicant
// DELETE /api/employment/applicant/:id

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::api::validate::{is_valid_email, required};
use crate::error::ApiError;
use crate::handlers::IdQuery;
use crate::mail::Mail;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{EmploymentService, ProfileService, UserService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantInfo {
    pub applicant_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_list: Option<Vec<Applicant>>,
}

/// GET /api/employment/applicant/list?id= - applicant count; the author also sees who applied
pub async fn applicant_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<IdQuery>,
) -> ApiResult<ApplicantInfo> {
    let id = query.require()?;
    let owner = EmploymentService::new(state.pool.clone())
        .owner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job posting not found"))?;

    let applicants = owner.applicants();
    let mut info = ApplicantInfo { applicant_count: applicants.len(), applicant_list: None };

    if owner.user_id == user.email {
        let profiles = ProfileService::new(state.pool.clone()).image_keys(&applicants).await?;
        let mut list = Vec::with_capacity(profiles.len());
        for (id, image) in profiles {
            let profile_image = match image.as_deref() {
                Some(key) => state.storage.object_url(key).await?,
                None => None,
            };
            list.push(Applicant { id, profile_image });
        }
        info.applicant_list = Some(list);
    }

    Ok(ApiResponse::success(info))
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub id: Option<String>,
}

/// POST /api/employment/applicant - apply as a student
///
/// Applying twice is a no-op. The first application mails the author when
/// the author's id is an email address.
pub async fn apply(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ApplyRequest>,
) -> ApiResult<Value> {
    let id = required(&body.id, "id")?;

    let applicant = UserService::new(state.pool.clone())
        .find(&user.email)
        .await?
        .ok_or_else(|| ApiError::forbidden("Only students can apply"))?;
    let service = EmploymentService::new(state.pool.clone());
    let owner = service
        .owner(id)
        .await?
        .filter(|owner| !owner.is_deleted)
        .ok_or_else(|| ApiError::not_found("Job posting not found"))?;

    if !applicant.is_student || owner.user_id == applicant.id {
        return Err(ApiError::forbidden("You cannot apply to this posting"));
    }

    if service.apply(id, &applicant.id).await? {
        info!("{} applied to job posting {}", applicant.id, id);
        if is_valid_email(&owner.user_id) {
            let name = applicant.name.as_deref().unwrap_or(&applicant.nickname);
            if let Err(e) = state.mailer.send(Mail::application_notice(&owner.user_id, name, &applicant.id)).await {
                error!("Failed to notify {} of an application: {}", owner.user_id, e);
            }
        }
    }

    Ok(ApiResponse::created(json!({ "isApplied": true })))
}

/// DELETE /api/employment/applicant/:id - withdraw the caller's application
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    EmploymentService::new(state.pool.clone()).withdraw(&id, &user.email).await?;
    Ok(ApiResponse::success(json!({ "isDeleted": true })))
}
