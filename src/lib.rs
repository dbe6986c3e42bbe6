use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod map;
pub mod middleware;
pub mod services;
pub mod state;
pub mod storage;

#[cfg(test)]
pub mod testing;

use crate::config::ApiConfig;
use crate::database::manager::DatabaseManager;
use crate::state::AppState;

/// Full router: every route group under `/api/<group>` plus `/` and `/health`
pub fn app(state: AppState) -> Router {
    let api_config = &config::config().api;

    let api = Router::new()
        .nest("/auth", handlers::auth::routes())
        .nest("/token", handlers::token::routes())
        .nest("/help", handlers::help::routes())
        .nest("/category", handlers::category::routes())
        .nest("/map", handlers::map::routes())
        .nest("/banner", handlers::banner::routes())
        .nest("/employment", handlers::employment::routes(state.clone()))
        .nest("/community", handlers::community::routes(state.clone()))
        .nest("/profile", handlers::profile::routes())
        .nest("/senior-project", handlers::senior_project::routes(state.clone()))
        .nest("/management", handlers::management::routes());

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(api_config.max_request_size_bytes))
        .layer(cors_layer(api_config));

    let router = if api_config.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

/// Listed origins may send cookies; with no list every origin is allowed without credentials
fn cors_layer(api: &ApiConfig) -> CorsLayer {
    if api.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = api
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Boogie API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Job board, community and senior project showcase backend",
            "endpoints": {
                "auth": "/api/auth/* (public, /admin protected)",
                "token": "/api/token (refresh token)",
                "help": "/api/help/password (public)",
                "category": "/api/category/* (public)",
                "map": "/api/map/search (public)",
                "banner": "/api/banner (public)",
                "employment": "/api/employment/* (mixed)",
                "community": "/api/community/* (mixed)",
                "profile": "/api/profile/* (mixed)",
                "senior_project": "/api/senior-project/* (public reads, admin writes)",
                "management": "/api/management/* (admin)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
