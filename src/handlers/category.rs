// handlers/category.rs - /api/category lookup tables

use axum::{extract::State, routing::get, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::format::REGIONS;
use crate::database::models::Lookup;
use crate::database::Repository;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/job", get(job))
        .route("/platform", get(platform))
        .route("/technology", get(technology))
        .route("/region", get(region))
}

async fn lookup(state: &AppState, table: &'static str) -> Result<Vec<Lookup>, crate::error::ApiError> {
    Ok(Repository::<Lookup>::new(table, &state.pool).select_all().await?)
}

/// GET /api/category/job
pub async fn job(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "jobCategoryList": lookup(&state, "job_category").await? })))
}

/// GET /api/category/platform
pub async fn platform(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "platformList": lookup(&state, "platform").await? })))
}

/// GET /api/category/technology
pub async fn technology(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "technologyList": lookup(&state, "technology").await? })))
}

#[derive(Debug, Serialize)]
pub struct Region {
    pub id: &'static str,
    pub name: &'static str,
}

pub fn region_list() -> Vec<Region> {
    REGIONS.iter().map(|&(id, name)| Region { id, name }).collect()
}

/// GET /api/category/region - static, served without touching the database
pub async fn region() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "regionList": region_list() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_keep_area_code_order() {
        let regions = region_list();
        assert_eq!(regions.len(), 17);
        assert_eq!((regions[0].id, regions[0].name), ("02", "서울"));
        assert_eq!((regions[16].id, regions[16].name), ("064", "제주"));
    }
}
