// handlers/senior_project/mod.rs - /api/senior-project capstone showcase

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};

use crate::middleware::{require_access, senior_project_view};
use crate::state::AppState;

pub mod form;
pub mod read;
pub mod write;

pub use read::{announced, design, detail, group, list, members, recommend};
pub use write::{create, delete_member, remove, update};

pub fn routes(state: AppState) -> Router<AppState> {
    let viewed = Router::new()
        .route("/detail/group", get(group))
        .route_layer(from_fn_with_state(state, senior_project_view));

    let public = Router::new()
        .route("/list", get(list))
        .route("/recommend", get(recommend))
        .route("/detail/members", get(members))
        .route("/detail/design", get(design))
        .route("/detail/announced", get(announced));

    let admin = Router::new()
        .route("/", post(create).patch(update))
        .route("/detail", get(detail))
        .route("/:id", delete(remove))
        .route("/member/:uni_id", delete(delete_member))
        .route_layer(from_fn(require_access));

    viewed.merge(public).merge(admin)
}
