// handlers/employment/mod.rs - /api/employment job postings and applications

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};

use crate::middleware::{job_posting_view, optional_user, require_access};
use crate::state::AppState;

pub mod applicant;
pub mod posting;

pub use applicant::{applicant_list, apply, withdraw};
pub use posting::{create, detail, list, remove, update};

pub fn routes(state: AppState) -> Router<AppState> {
    let viewed = Router::new()
        .route("/", get(detail))
        .route_layer(from_fn_with_state(state, job_posting_view))
        .route_layer(from_fn(optional_user));

    let public = Router::new().route("/list", get(list));

    let protected = Router::new()
        .route("/", post(create))
        .route("/:id", patch(update).delete(remove))
        .route("/applicant", post(apply))
        .route("/applicant/list", get(applicant_list))
        .route("/applicant/:id", delete(withdraw))
        .route_layer(from_fn(require_access));

    viewed.merge(public).merge(protected)
}
