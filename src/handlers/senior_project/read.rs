// handlers/senior_project/read.rs - showcase reads
//
// GET /api/senior-project/list?year=&classId=&name=&platform=&technology=
// GET /api/senior-project/recommend?id=
// GET /api/senior-project/detail/members?id=
// GET /api/senior-project/detail/design?id=
// GET /api/senior-project/detail/announced?id=
// GET /api/senior-project/detail/group?id=   view-counted
// GET /api/senior-project/detail?id=         admin edit view

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Extension,
};
use axum_extra::extract::Query as MultiQuery;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::validate::{int_list, optional_int};
use crate::database::models::{Lookup, SeniorProjectRow, TeamMemberRow};
use crate::error::ApiError;
use crate::handlers::{image_url, require_admin, IdQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::senior_project_service::{group_member_names, ProjectFilter};
use crate::services::SeniorProjectService;
use crate::state::AppState;

fn not_found() -> ApiError {
    ApiError::not_found("Senior project not found")
}

async fn find(state: &AppState, id: &str) -> Result<SeniorProjectRow, ApiError> {
    SeniorProjectService::new(state.pool.clone())
        .find(id)
        .await?
        .ok_or_else(not_found)
}

/// Card shown in the list and the recommendations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub group_name: String,
    pub team_member: String,
    pub platform: String,
    pub technology: Vec<String>,
    pub view_count: i32,
}

fn names(lookups: Vec<Lookup>) -> Vec<String> {
    lookups.into_iter().map(|lookup| lookup.name).collect()
}

async fn summarize(
    service: &SeniorProjectService,
    rows: Vec<SeniorProjectRow>,
    with_year: bool,
) -> Result<Vec<ProjectSummary>, ApiError> {
    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let members: HashMap<String, Vec<String>> = if ids.is_empty() {
        HashMap::new()
    } else {
        group_member_names(&service.members_of(&ids).await?)
    };

    let mut summaries = Vec::with_capacity(rows.len());
    for row in rows {
        let platform = names(service.lookups("platform", &row.platform.0).await?).join(", ");
        let technology = names(service.lookups("technology", &row.technology.0).await?);
        summaries.push(ProjectSummary {
            team_member: members.get(&row.id).map(|names| names.join(", ")).unwrap_or_default(),
            year: with_year.then(|| row.year.clone()),
            id: row.id,
            group_name: row.group_name,
            platform,
            technology,
            view_count: row.view_count,
        });
    }
    Ok(summaries)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub year: Option<String>,
    pub class_id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Vec<String>,
    #[serde(default)]
    pub technology: Vec<String>,
}

impl ListQuery {
    pub fn into_filter(self) -> Result<ProjectFilter, ApiError> {
        let year = self
            .year
            .map(|year| year.trim().to_string())
            .filter(|year| !year.is_empty())
            .ok_or_else(|| ApiError::missing_fields(&["year"]))?;
        Ok(ProjectFilter {
            year,
            class_id: optional_int(self.class_id.as_deref(), "classId")?,
            member_name: self.name.filter(|name| !name.trim().is_empty()),
            platform: int_list(&self.platform, "platform")?,
            technology: int_list(&self.technology, "technology")?,
        })
    }
}

/// GET /api/senior-project/list - random order
pub async fn list(State(state): State<AppState>, MultiQuery(query): MultiQuery<ListQuery>) -> ApiResult<Value> {
    let filter = query.into_filter()?;
    let service = SeniorProjectService::new(state.pool.clone());
    let rows = service.list(&filter).await?;
    let senior_project_list = summarize(&service, rows, false).await?;
    Ok(ApiResponse::success(json!({ "seniorProjectList": senior_project_list })))
}

/// GET /api/senior-project/recommend?id= - other projects on the same platforms
pub async fn recommend(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Value> {
    let id = query.require()?;
    let project = find(&state, id).await?;

    let service = SeniorProjectService::new(state.pool.clone());
    let rows = service.recommend(id, &project.platform.0).await?;
    let recommend_list = summarize(&service, rows, true).await?;
    Ok(ApiResponse::success(json!({ "seniorProjectRecommendList": recommend_list })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub name: String,
    pub introduction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Account id when the member has signed up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub uni_id: String,
}

async fn member_views(state: &AppState, rows: Vec<TeamMemberRow>) -> Result<Vec<MemberView>, ApiError> {
    let service = SeniorProjectService::new(state.pool.clone());
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let image = image_url(state.storage.as_ref(), row.profile_image.as_deref()).await?;
        let id = service.member_account(&row.uni_id, &row.name).await?;
        views.push(MemberView { name: row.name, introduction: row.introduction, image, id, uni_id: row.uni_id });
    }
    Ok(views)
}

/// GET /api/senior-project/detail/members?id=
pub async fn members(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Value> {
    let id = query.require()?;
    let rows = SeniorProjectService::new(state.pool.clone()).members(id).await?;
    let member_list = member_views(&state, rows).await?;
    Ok(ApiResponse::success(json!({ "seniorProjectMemberList": member_list })))
}

/// GET /api/senior-project/detail/design?id= - presigned link to the design file
pub async fn design(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Value> {
    let id = query.require()?;
    let project = find(&state, id).await?;

    let project_design = match project.project_design.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => state.storage.object_url(key).await?,
        None => None,
    };
    Ok(ApiResponse::success(json!({ "projectDesign": project_design })))
}

/// GET /api/senior-project/detail/announced?id=
pub async fn announced(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Value> {
    let id = query.require()?;
    let project = find(&state, id).await?;
    Ok(ApiResponse::success(json!({ "link": project.link.0 })))
}

/// GET /api/senior-project/detail/group?id=
pub async fn group(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Value> {
    let id = query.require()?;
    let project = find(&state, id).await?;
    Ok(ApiResponse::success(json!({ "groupName": project.group_name, "year": project.year })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: String,
    pub year: String,
    pub link: Vec<Value>,
    pub group_name: String,
    pub project_design: Option<String>,
    pub platform: Vec<Lookup>,
    pub technology: Vec<Lookup>,
    pub class_info: Option<Lookup>,
    pub team_member: Vec<MemberView>,
}

/// GET /api/senior-project/detail?id= - everything the edit form needs
pub async fn detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Value> {
    let id = query.require()?;
    require_admin(&state, &user.email).await?;
    let project = find(&state, id).await?;

    let service = SeniorProjectService::new(state.pool.clone());
    let members = service.members(id).await?;
    let info = ProjectDetail {
        platform: service.lookups("platform", &project.platform.0).await?,
        technology: service.lookups("technology", &project.technology.0).await?,
        class_info: service.class_info(project.class_id).await?,
        team_member: member_views(&state, members).await?,
        id: project.id,
        year: project.year,
        link: project.link.0,
        group_name: project.group_name,
        project_design: project.project_design,
    };
    Ok(ApiResponse::success(json!({ "seniorProjectDetailInfo": info })))
}
