//! HTTP-level tests for the REST server.
//! Spins up the axum server on a random port and sends raw HTTP requests.

use hived::{config::AppConfig, rest, storage::Storage, AppContext};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Find a free local port by binding to port 0.
fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn start_server(dir: &TempDir, port: u16, api_token: Option<&str>) -> Arc<AppContext> {
    let data_dir = dir.path().to_path_buf();
    let config = Arc::new(AppConfig {
        port,
        data_dir: data_dir.clone(),
        log: "error".to_string(),
        bind_address: "127.0.0.1".to_string(),
        database_path: data_dir.join("hived.db"),
        api_token: api_token.map(str::to_string),
        log_format: "pretty".to_string(),
    });
    let storage = Storage::new(&config.database_path).await.unwrap();
    let ctx = Arc::new(AppContext::new(config, storage));

    let ctx_clone = ctx.clone();
    tokio::spawn(async move {
        let _ = rest::start_rest_server(ctx_clone).await;
    });
    // Give the server a moment to start
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    ctx
}

/// Send one request and return (status line, body).
async fn get(port: u16, path: &str, bearer: Option<&str>) -> (String, String) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{port}"))
        .await
        .unwrap();
    let auth = bearer
        .map(|t| format!("Authorization: Bearer {t}\r\n"))
        .unwrap_or_default();
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{auth}Connection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let response = String::from_utf8_lossy(&buf).to_string();

    let status = response.lines().next().unwrap_or("").to_string();
    let body_start = response
        .find("\r\n\r\n")
        .map(|i| i + 4)
        .expect("no body in response");
    (status, response[body_start..].to_string())
}

#[tokio::test]
async fn health_reports_ok_without_auth() {
    let dir = TempDir::new().unwrap();
    let port = find_free_port();
    start_server(&dir, port, Some("sekrit")).await;

    let (status, body) = get(port, "/api/v1/health", None).await;
    assert!(status.contains("200"), "expected HTTP 200, got: {status}");

    let json: serde_json::Value = serde_json::from_str(&body).expect("body is not valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"].as_str().unwrap(), env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn api_requires_bearer_token_when_configured() {
    let dir = TempDir::new().unwrap();
    let port = find_free_port();
    start_server(&dir, port, Some("sekrit")).await;

    let (status, _) = get(port, "/api/v1/diagnostic/questions", None).await;
    assert!(status.contains("401"), "expected HTTP 401, got: {status}");

    let (status, _) = get(port, "/api/v1/diagnostic/questions", Some("wrong")).await;
    assert!(status.contains("401"), "expected HTTP 401, got: {status}");

    let (status, body) = get(port, "/api/v1/diagnostic/questions", Some("sekrit")).await;
    assert!(status.contains("200"), "expected HTTP 200, got: {status}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["questions"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn api_is_open_when_no_token_is_set() {
    let dir = TempDir::new().unwrap();
    let port = find_free_port();
    start_server(&dir, port, None).await;

    let (status, _) = get(port, "/api/v1/diagnostic/questions", None).await;
    assert!(status.contains("200"), "expected HTTP 200, got: {status}");
}

#[tokio::test]
async fn unknown_user_dashboard_is_404_with_json_error() {
    let dir = TempDir::new().unwrap();
    let port = find_free_port();
    start_server(&dir, port, None).await;

    let (status, body) = get(port, "/api/v1/users/31337/dashboard/summary", None).await;
    assert!(status.contains("404"), "expected HTTP 404, got: {status}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("31337"));
}
