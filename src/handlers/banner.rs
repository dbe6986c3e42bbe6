// handlers/banner.rs - GET /api/banner handler

use axum::{extract::State, routing::get, Router};
use futures::future::try_join_all;
use serde_json::{json, Value};

use crate::handlers::image_url;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::BannerService;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list))
}

/// GET /api/banner - public URLs of the current banner images
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let banners = BannerService::new(state.pool.clone()).list().await?;

    let storage = state.storage.as_ref();
    let urls = try_join_all(
        banners
            .iter()
            .map(|banner| async move { image_url(storage, Some(&banner.object_key())).await }),
    )
    .await?;
    let banner_image_list: Vec<String> = urls.into_iter().flatten().collect();

    Ok(ApiResponse::success(json!({ "bannerImageList": banner_image_list })))
}
