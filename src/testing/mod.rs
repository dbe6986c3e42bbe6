//! Router-level tests that never reach MySQL.
//!
//! The pool is lazy and points at an unreachable address, so only requests
//! rejected by the middleware or by request validation are exercised here.
//! Database-backed flows live in `tests/`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{generate_jwt, issue, Claims, TokenKind};
use crate::config::{DatabaseConfig, MapConfig};
use crate::database::manager::DatabaseManager;
use crate::mail::LogMailer;
use crate::map::KakaoMapClient;
use crate::state::AppState;
use crate::storage::MemoryStorage;

/// State with in-memory storage, a logging mailer and a pool that never connects
pub fn test_state() -> AppState {
    let database = DatabaseConfig {
        url: Some("mysql://boogie@127.0.0.1:9/boogie".to_string()),
        host: "127.0.0.1".to_string(),
        port: 9,
        user: "boogie".to_string(),
        password: String::new(),
        name: "boogie".to_string(),
        max_connections: 1,
        connection_timeout: 1,
        run_migrations: false,
    };
    let pool = DatabaseManager::connect_lazy(&database).expect("lazy pool");
    let map = KakaoMapClient::new(&MapConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        kakao_api_key: String::new(),
    });
    AppState::new(pool, Arc::new(MemoryStorage::new()), Arc::new(LogMailer::new()), map)
}

pub fn test_app() -> Router {
    crate::app(test_state())
}

/// Send one request through a fresh router; returns status and JSON body
pub async fn send(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = test_app().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub fn expired_access_token(email: &str) -> String {
    let issued = Utc::now() - Duration::hours(2);
    generate_jwt(Claims {
        sub: TokenKind::Access,
        email: email.to_string(),
        exp: (issued + Duration::hours(1)).timestamp(),
        iat: issued.timestamp(),
    })
    .expect("token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let (status, body) = send(Method::POST, "/api/employment/applicant", None, Some(json!({ "id": "x" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], true);

        let (status, _) = send(Method::GET, "/api/management/banner", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_access_token_answers_419() {
        let token = expired_access_token("kim@example.com");
        let (status, body) = send(Method::PATCH, "/api/community/like/abc", Some(&token), None).await;
        assert_eq!(status.as_u16(), 419);
        assert_eq!(body["code"], "expired");
        assert_eq!(body["type"], "access");
    }

    #[tokio::test]
    async fn expired_token_on_optional_route_is_not_ignored() {
        let token = expired_access_token("kim@example.com");
        let (status, _) = send(Method::GET, "/api/community/list?categoryId=1&page=1", Some(&token), None).await;
        assert_eq!(status.as_u16(), 419);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let refresh = issue(TokenKind::Refresh, "kim@example.com").expect("token");
        let (status, _) = send(Method::DELETE, "/api/community/abc", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_route_needs_a_refresh_token() {
        let access = issue(TokenKind::Access, "kim@example.com").expect("token");
        let (status, _) = send(Method::POST, "/api/token/refreshToken", Some(&access), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_reports_missing_fields() {
        let (status, body) = send(Method::POST, "/api/auth/login", None, Some(json!({ "id": "kim@example.com" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["field_errors"].get("password").is_some());
    }

    #[tokio::test]
    async fn health_hides_database_errors() {
        let (status, body) = send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["data"]["database"], "unavailable");
        assert!(body["data"].get("database_error").is_none());
    }

    #[tokio::test]
    async fn community_page_must_be_positive() {
        let (status, _) = send(Method::GET, "/api/community/list?categoryId=1&page=9223372036854775807", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(Method::GET, "/api/community/list?categoryId=1&page=0", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(Method::GET, "/api/community/list?categoryId=1", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn senior_project_list_needs_a_year() {
        let (status, _) = send(Method::GET, "/api/senior-project/list?platform=1&platform=2", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_list_filters_answer_with_json_errors() {
        let (status, body) = send(Method::GET, "/api/senior-project/list?year=2023&platform=abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);

        let (status, body) = send(Method::GET, "/api/employment/list?position=1&position=x", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn map_search_needs_an_address() {
        let (status, _) = send(Method::GET, "/api/map/search", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn regions_are_served_without_the_database() {
        let (status, body) = send(Method::GET, "/api/category/region", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["regionList"][0], json!({ "id": "02", "name": "서울" }));
        assert_eq!(body["data"]["regionList"].as_array().map(Vec::len), Some(17));
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let (status, _) = send(Method::GET, "/api/nothing-here", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
