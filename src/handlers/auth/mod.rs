// handlers/auth/mod.rs - /api/auth
//
// Email verification, login and account creation. Everything here is public
// except admin creation, which needs an admin's access token.

use axum::{middleware::from_fn, routing::post, Router};

use crate::middleware::require_access;
use crate::state::AppState;

pub mod code;
pub mod join;
pub mod login;

pub use code::{send_code, verify_code};
pub use join::{admin_join, join};
pub use login::login;

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/code/email", post(send_code))
        .route("/email", post(verify_code))
        .route("/login", post(login))
        .route("/join", post(join));

    let protected = Router::new()
        .route("/admin", post(admin_join))
        .route_layer(from_fn(require_access));

    public.merge(protected)
}
