// handlers/map.rs - GET /api/map/search handler

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::validate::required;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/search", get(search))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub address: Option<String>,
}

/// GET /api/map/search?address= - road addresses matching a keyword
pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> ApiResult<Value> {
    let address = required(&query.address, "address")?;
    let search_result_list = state.map.search(address).await?;
    Ok(ApiResponse::success(json!({ "searchResultList": search_result_list })))
}
