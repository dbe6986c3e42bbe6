mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn protected_routes_reject_missing_tokens() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.post(server.url("/api/community")).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.patch(server.url("/api/profile/open")).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(server.url("/api/management/admin/list")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn garbage_tokens_are_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .get(server.url("/api/employment/applicant/list?id=x"))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await?;

    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn login_validates_before_touching_the_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/login"))
        .json(&json!({ "password": "secret" }))
        .send()
        .await?;

    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"].get("id").is_some());
    Ok(())
}

#[tokio::test]
async fn code_request_rejects_malformed_email() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/code/email"))
        .json(&json!({ "id": "not-an-email" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn region_list_is_static() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::read(reqwest::get(server.url("/api/category/region")).await?).await?;

    assert_eq!(status, StatusCode::OK);
    let regions = body["data"]["regionList"].as_array().cloned().unwrap_or_default();
    assert_eq!(regions.len(), 17);
    assert_eq!(regions[16], json!({ "id": "064", "name": "제주" }));
    Ok(())
}
