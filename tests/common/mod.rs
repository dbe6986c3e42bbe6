#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Secret the spawned server signs with
pub const JWT_SECRET: &str = "boogie-integration-secret";

/// Database used by the flows that need MySQL; those tests are skipped without it
pub const DATABASE_ENV: &str = "BOOGIE_TEST_DATABASE_URL";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_boogie-api"));
        cmd.env("BOOGIE_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", JWT_SECRET)
            .env("DATABASE_CONNECTION_TIMEOUT", "2")
            .env_remove("S3_BUCKET_NAME")
            .env_remove("SMTP_HOST")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Ok(url) = std::env::var(DATABASE_ENV) {
            cmd.env("DATABASE_URL", url).arg("--migrate");
        }

        let child = cmd.spawn().context("failed to spawn server binary")?;
        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Up even when the database is not
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(server)
}

pub fn database_enabled() -> bool {
    std::env::var(DATABASE_ENV).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Status and JSON body of a response
pub async fn read(resp: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    Ok((status, body))
}

/// Unique suffix for ids and nicknames created by a test run
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}{}", prefix, nanos % 1_000_000_000)
}

/// Join a non-student account and log in; returns the email and access token
pub async fn join_and_login(client: &reqwest::Client, server: &TestServer) -> Result<(String, String)> {
    let email = format!("{}@example.com", unique("member"));
    let nickname = unique("nick");

    let res = client
        .post(server.url("/api/auth/join"))
        .json(&json!({
            "id": email,
            "nickname": nickname,
            "password": "pw1234!",
            "verifyPassword": "pw1234!",
            "isStudent": false,
        }))
        .send()
        .await?;
    let (status, body) = read(res).await?;
    assert_eq!(status, StatusCode::CREATED, "join failed: {}", body);

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "id": email, "password": "pw1234!" }))
        .send()
        .await?;
    let (status, body) = read(res).await?;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    assert_eq!(body["data"]["isAdmin"], false);

    let token = body["data"]["accessToken"].as_str().context("accessToken")?.to_string();
    Ok((email, token))
}
