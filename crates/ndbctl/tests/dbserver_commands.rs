//! End-to-end command tests against a mock NDB server

use assert_cmd::Command;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, dir: &TempDir) -> String {
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!(
            r#"
[profiles.mock]
url = "{}"
username = "admin"
password = "secret"

[profiles.mock.timeouts]
delete_secs = 10
poll_interval_secs = 1
"#,
            server.uri()
        ),
    )
    .unwrap();
    path.display().to_string()
}

async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("ndbctl")
            .unwrap()
            .env_remove("NDB_URL")
            .env_remove("NDB_PASSWORD")
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn args(config: &str, rest: &[&str]) -> Vec<String> {
    let mut all = vec!["--config-file".to_string(), config.to_string()];
    all.extend(rest.iter().map(|s| s.to_string()));
    all
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dbserver_get_prints_flattened_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/era/v0.9/dbservers/srv-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "srv-1",
            "name": "pg-vm-01",
            "ipAddresses": ["10.0.0.5"],
            "status": "UP",
            "vmTimeZone": "UTC"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, &dir);
    let output = run(args(&config, &["dbserver", "get", "srv-1", "-o", "json"])).await;

    assert!(output.status.success());
    let stdout: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stdout["id"], "srv-1");
    assert_eq!(stdout["name"], "pg-vm-01");
    assert_eq!(stdout["vm_timezone"], "UTC");
    assert_eq!(stdout["ip_addresses"], json!(["10.0.0.5"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dbserver_delete_waits_for_operation() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/era/v0.9/dbservers/srv-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-1", "operationId": "op-7"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/era/v0.9/operations/op-7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "op-7", "status": "5"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, &dir);
    let output = run(args(&config, &["dbserver", "delete", "srv-1"])).await;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("DB server srv-1 deleted"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_operation_wait_fails_on_failed_operation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/era/v0.9/operations/op-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"id": "op-8", "status": "FAILED", "message": "cluster unreachable"}),
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, &dir);
    let output = run(args(&config, &["operation", "wait", "op-8", "-o", "json"])).await;

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"status\": \"FAILED\""));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cluster unreachable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/era/v0.9/operations/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Operation not found"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, &dir);
    let output = run(args(&config, &["operation", "get", "missing"])).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Operation not found"));
}
