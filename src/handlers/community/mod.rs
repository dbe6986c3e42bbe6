// handlers/community/mod.rs - /api/community board contents, comments and likes

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};

use crate::middleware::{board_content_view, optional_user, require_access};
use crate::state::AppState;

pub mod comment;
pub mod content;
pub mod view;

pub use comment::{add_comment, comment_list, remove_comment};
pub use content::{best_pick, create, detail, list, remove, toggle_like, update};

pub fn routes(state: AppState) -> Router<AppState> {
    let viewed = Router::new()
        .route("/", get(detail))
        .route_layer(from_fn_with_state(state, board_content_view))
        .route_layer(from_fn(optional_user));

    let optional = Router::new()
        .route("/list", get(list))
        .route("/comments", get(comment_list))
        .route_layer(from_fn(optional_user));

    let public = Router::new().route("/best-pick", get(best_pick));

    let protected = Router::new()
        .route("/", post(create).patch(update))
        .route("/:id", delete(remove))
        .route("/comment", post(add_comment))
        .route("/comment/:id", delete(remove_comment))
        .route("/like/:id", patch(toggle_like))
        .route_layer(from_fn(require_access));

    viewed.merge(optional).merge(public).merge(protected)
}
