mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(server.url("/health")).await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert!(body["data"]["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn root_lists_route_groups() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::read(reqwest::get(server.url("/")).await?).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Boogie API");
    assert!(body["data"]["endpoints"]["senior_project"].is_string());
    Ok(())
}
