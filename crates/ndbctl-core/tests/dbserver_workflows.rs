//! Integration tests for the DB server workflows against a mock NDB server

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ndbctl_core::params::{Credential, DbServerConfig, DeleteDbServerParams, UpdateDbServerParams};
use ndbctl_core::{
    CoreError, NdbApi, NdbClient, ProgressEvent, ResourceState, WaitOptions,
    create_dbserver_and_wait, delete_dbserver_and_wait, read_dbserver, update_dbserver,
    wait_for_operation,
};
use serde_json::{Value, json};
use wiremock::matchers::{basic_auth, body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "/era/v0.9";

fn client(server: &MockServer) -> NdbClient {
    NdbClient::builder(server.uri(), "admin", "secret")
        .build()
        .expect("client builds")
}

fn fast_wait() -> WaitOptions {
    WaitOptions::new(Duration::from_secs(5), Duration::from_millis(10))
}

fn provision_config() -> DbServerConfig {
    DbServerConfig::new("postgres_database", "np-1", "cp-1", "cluster-1", "vm-pw")
        .with_software_profile("sp-1", "spv-1")
        .with_postgres_database("db-vm-1", "ssh-rsa AAAA")
}

fn server_fixture(id: &str) -> Value {
    json!({
        "id": id,
        "name": "db-vm-1",
        "description": "provisioned by ndbctl",
        "properties": [{"name": "os_type", "value": "linux"}],
        "tags": [],
        "eraCreated": true,
        "internal": false,
        "ipAddresses": ["10.0.0.5"],
        "macAddresses": ["50:6b:8d:00:00:01"],
        "type": "DBSERVER",
        "placeholder": false,
        "status": "UP",
        "vmClusterName": "cluster-1",
        "vmTimeZone": "UTC"
    })
}

fn operation(id: &str, status: &str) -> Value {
    json!({"id": id, "status": status, "percentageComplete": "50"})
}

/// Answer PENDING `pending` times, then `last` from there on
async fn mount_operation_sequence(server: &MockServer, op_id: &str, pending: u64, last: Value) {
    if pending > 0 {
        Mock::given(method("GET"))
            .and(path(format!("{}/operations/{}", BASE, op_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(operation(op_id, "PENDING")))
            .up_to_n_times(pending)
            .with_priority(1)
            .expect(pending)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(format!("{}/operations/{}", BASE, op_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(last))
        .with_priority(2)
        .mount(server)
        .await;
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_polls_until_completed_then_reads_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/dbservers/provision", BASE)))
        .and(basic_auth("admin", "secret"))
        .and(body_partial_json(json!({
            "databaseType": "postgres_database",
            "softwareProfileId": "sp-1",
            "softwareProfileVersionId": "spv-1",
            "latestSnapshot": true,
            "actionArguments": [
                {"name": "vm_name", "value": "db-vm-1"},
                {"name": "client_public_key", "value": "ssh-rsa AAAA"}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-1", "operationId": "op-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_operation_sequence(&server, "op-1", 2, operation("op-1", "5")).await;

    Mock::given(method("GET"))
        .and(path(format!("{}/dbservers/srv-1", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_fixture("srv-1")))
        .expect(1)
        .mount(&server)
        .await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let mut state = ResourceState::new();
    let created = create_dbserver_and_wait(
        &client(&server),
        &provision_config(),
        &mut state,
        fast_wait(),
        Some(Box::new(move |event| sink.lock().unwrap().push(event))),
    )
    .await
    .expect("create succeeds");

    assert_eq!(created.id, "srv-1");
    assert_eq!(state.id(), Some("srv-1"));
    assert_eq!(state.get("name"), Some(&json!("db-vm-1")));
    assert_eq!(state.get("type"), Some(&json!("DBSERVER")));
    assert_eq!(state.get("vm_timezone"), Some(&json!("UTC")));
    assert_eq!(
        state.get("properties"),
        Some(&json!([{"name": "os_type", "value": "linux"}]))
    );

    let events = events.lock().unwrap();
    let polls = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Polling { .. }))
        .count();
    assert_eq!(polls, 3);
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
}

#[tokio::test]
async fn test_create_failed_operation_keeps_id_and_reports_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/dbservers/provision", BASE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-2", "operationId": "op-2"})),
        )
        .mount(&server)
        .await;

    mount_operation_sequence(
        &server,
        "op-2",
        1,
        json!({
            "id": "op-2",
            "status": "4",
            "message": "disk attach failed",
            "percentageComplete": "40"
        }),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/dbservers/srv-2", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_fixture("srv-2")))
        .expect(0)
        .mount(&server)
        .await;

    let mut state = ResourceState::new();
    let err = create_dbserver_and_wait(
        &client(&server),
        &provision_config(),
        &mut state,
        fast_wait(),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_operation_failed());
    assert!(err.to_string().contains("disk attach failed"));
    assert_eq!(state.id(), Some("srv-2"));
}

#[tokio::test]
async fn test_create_without_operation_id_does_not_poll() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/dbservers/provision", BASE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-3", "operationId": ""})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/era/v0\.9/operations/.*$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut state = ResourceState::new();
    let err = create_dbserver_and_wait(
        &client(&server),
        &provision_config(),
        &mut state,
        fast_wait(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CoreError::MissingOperationId { .. }));
    assert!(
        err.to_string()
            .starts_with("error: operation ID is an empty string")
    );
}

#[tokio::test]
async fn test_create_invalid_config_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = provision_config().with_time_machine("tm-1");
    let mut state = ResourceState::new();
    let err = create_dbserver_and_wait(&client(&server), &config, &mut state, fast_wait(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert!(state.id().is_none());
}

#[tokio::test]
async fn test_create_times_out_on_stuck_operation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/dbservers/provision", BASE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-4", "operationId": "op-4"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/operations/op-4", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-4", "PENDING")))
        .mount(&server)
        .await;

    let wait = WaitOptions::new(Duration::from_millis(200), Duration::from_millis(20));
    let mut state = ResourceState::new();
    let err = create_dbserver_and_wait(
        &client(&server),
        &provision_config(),
        &mut state,
        wait,
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_timeout());
    assert!(err.to_string().contains("op-4"));
    assert!(err.to_string().contains("srv-4"));
}

// ============================================================================
// Read / Update
// ============================================================================

#[tokio::test]
async fn test_read_not_found_maps_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/dbservers/missing", BASE)))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "DB server not found"})),
        )
        .mount(&server)
        .await;

    let mut state = ResourceState::new();
    let err = read_dbserver(&client(&server), "missing", &mut state)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("DB server not found"));
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_update_sends_reset_flags_and_writes_back() {
    let server = MockServer::start().await;

    let mut updated = server_fixture("srv-1");
    updated["name"] = json!("renamed");
    updated["description"] = json!("new description");

    Mock::given(method("PATCH"))
        .and(path(format!("{}/dbservers/srv-1", BASE)))
        .and(body_partial_json(json!({
            "name": "renamed",
            "description": "new description",
            "resetName": true,
            "resetDescription": true,
            "resetCredential": false,
            "resetTags": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let params = UpdateDbServerParams::new()
        .with_name("renamed")
        .with_description("new description");

    let mut state = ResourceState::new();
    let response = update_dbserver(&client(&server), "srv-1", params, &mut state)
        .await
        .expect("update succeeds");

    assert!(response.is_some());
    assert_eq!(state.get("name"), Some(&json!("renamed")));
    assert_eq!(state.get("description"), Some(&json!("new description")));
}

#[tokio::test]
async fn test_update_tolerates_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/dbservers/srv-1", BASE)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut state = ResourceState::new();
    let response = update_dbserver(
        &client(&server),
        "srv-1",
        UpdateDbServerParams::new().with_description("d"),
        &mut state,
    )
    .await
    .expect("update succeeds");

    assert!(response.is_none());
    assert!(state.get("description").is_none());
}

#[tokio::test]
async fn test_update_credentials_resets_credential_list() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/dbservers/srv-1", BASE)))
        .and(body_partial_json(json!({
            "resetCredential": true,
            "resetName": false,
            "resetDescription": false,
            "credentials": [{"username": "era", "password": "rotated", "label": "ssh"}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let params = UpdateDbServerParams::new().with_credentials(vec![Credential {
        username: "era".to_string(),
        password: "rotated".to_string(),
        label: Some("ssh".to_string()),
    }]);
    assert!(!params.is_empty());

    let mut state = ResourceState::new();
    let response = update_dbserver(&client(&server), "srv-1", params, &mut state)
        .await
        .expect("update succeeds");

    assert!(response.is_none());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_waits_and_clears_state() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/dbservers/srv-1", BASE)))
        .and(body_partial_json(json!({
            "delete": true,
            "remove": false,
            "softRemove": false,
            "deleteVgs": true,
            "deleteVmSnapshots": true
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-1", "operationId": "op-del"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_operation_sequence(&server, "op-del", 1, operation("op-del", "COMPLETED")).await;

    let api = client(&server);
    let mut state = ResourceState::new();
    state.set_id("srv-1");

    delete_dbserver_and_wait(
        &api,
        "srv-1",
        DeleteDbServerParams::new(),
        &mut state,
        fast_wait(),
        None,
    )
    .await
    .expect("delete succeeds");

    assert!(state.id().is_none());
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_delete_failed_operation_keeps_state() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/dbservers/srv-1", BASE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-1", "operationId": "op-d"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_operation_sequence(
        &server,
        "op-d",
        1,
        json!({"id": "op-d", "status": "4", "message": "vm locked"}),
    )
    .await;

    let mut state = ResourceState::new();
    state.set_id("srv-1");

    let err = delete_dbserver_and_wait(
        &client(&server),
        "srv-1",
        DeleteDbServerParams::new(),
        &mut state,
        fast_wait(),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_operation_failed());
    assert!(err.to_string().contains("vm locked"));
    assert_eq!(state.id(), Some("srv-1"));
}

#[tokio::test]
async fn test_delete_without_operation_id_does_not_poll() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/dbservers/srv-1", BASE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"entityId": "srv-1", "operationId": ""})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/era/v0\.9/operations/.*$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut state = ResourceState::new();
    state.set_id("srv-1");

    let err = delete_dbserver_and_wait(
        &client(&server),
        "srv-1",
        DeleteDbServerParams::new(),
        &mut state,
        fast_wait(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CoreError::MissingOperationId { .. }));
    assert_eq!(state.id(), Some("srv-1"));
}

#[tokio::test]
async fn test_wait_for_operation_returns_failed_without_escalating() {
    let server = MockServer::start().await;

    mount_operation_sequence(&server, "op-9", 0, operation("op-9", "FAILED")).await;

    let api = client(&server);
    let result = wait_for_operation(&api, "op-9", fast_wait(), None)
        .await
        .expect("poll finishes");

    assert!(!result.is_completed());
    assert_eq!(result.attempts, 1);

    // Reachable through the trait object as well
    let dynamic: &dyn NdbApi = &api;
    let operation = dynamic.get_operation("op-9").await.unwrap();
    assert_eq!(operation.status, "FAILED");
}
