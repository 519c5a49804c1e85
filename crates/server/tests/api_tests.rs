//! Integration tests for the JQL API endpoints

use axum::http::StatusCode;
use axum_test::TestServer;
use jql::suggest::{AutoComplete, StaticValueLookup};
use jql::JqlMetadata;
use serde_json::{json, Value};
use std::sync::Arc;

/// Helper to create a test server over the shared metadata fixture
fn create_test_server() -> TestServer {
    let metadata =
        JqlMetadata::from_json(include_str!("../../jql/tests/fixtures/metadata.json"))
            .expect("Failed to load fixture");
    let lookup = StaticValueLookup::new()
        .with_values("status", ["Open", "\"In Progress\"", "Closed", "Reopened"])
        .with_values("by", ["admin", "fred"]);
    let session = AutoComplete::new(metadata, lookup);

    let app = jql_server::create_routes(Arc::new(session));
    TestServer::new(app).expect("Failed to create test server")
}

#[tokio::test]
async fn test_parse_valid_query() {
    let server = create_test_server();

    let response = server
        .get("/jql/parse")
        .add_query_param("jql", "project = TEST ORDER BY created DESC")
        .await;

    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["valid"], true);
    assert_eq!(report["last"]["orderByField"], "created");
    assert_eq!(report["expectation"]["kind"], "nothing");
}

#[tokio::test]
async fn test_parse_invalid_query_reports_annotation() {
    let server = create_test_server();

    let response = server
        .get("/jql/parse")
        .add_query_param("jql", "project = TEST foo")
        .await;

    // An invalid query is still a successful request
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["valid"], false);
    assert!(report["message"].as_str().unwrap().contains('^'));
    assert!(report["errorIndex"].is_number());
}

#[tokio::test]
async fn test_parse_at_caret() {
    let server = create_test_server();

    let response = server
        .get("/jql/parse")
        .add_query_param("jql", "sta = Open")
        .add_query_param("caret", "3")
        .await;

    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["valid"], true);
    assert_eq!(report["expectation"]["kind"], "field");
    assert_eq!(report["last"]["field"], "sta");
}

#[tokio::test]
async fn test_parse_rejects_non_numeric_caret() {
    let server = create_test_server();

    let response = server
        .get("/jql/parse")
        .add_query_param("jql", "sta")
        .add_query_param("caret", "end")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_suggest_fields() {
    let server = create_test_server();

    let response = server
        .get("/jql/suggest")
        .add_query_param("jql", "sta")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["visible"], true);
    assert_eq!(body["suggestions"]["values"][0]["value"], "status");
    assert_eq!(body["suggestions"]["values"][0]["highlight"], 3);
}

#[tokio::test]
async fn test_suggest_hidden_for_empty_query() {
    let server = create_test_server();

    let response = server.get("/jql/suggest").add_query_param("jql", "").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "visible": false }));
}

#[tokio::test]
async fn test_suggest_list_operator_opens_paren() {
    let server = create_test_server();

    let response = server
        .get("/jql/suggest")
        .add_query_param("jql", "status in ")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let values: Vec<&str> = body["suggestions"]["values"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["value"].as_str())
        .collect();
    assert!(!values.is_empty());
    assert!(values.iter().all(|v| v.starts_with('(')));
}

#[tokio::test]
async fn test_suggest_predicate_values() {
    let server = create_test_server();

    let response = server
        .get("/jql/suggest")
        .add_query_param("jql", "status was Open by ")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let values: Vec<&str> = body["suggestions"]["values"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["value"].as_str())
        .collect();
    assert_eq!(values, ["admin", "fred", "EMPTY"]);
    assert_eq!(body["suggestions"]["functions"][0]["value"], "currentUser()");
}

#[tokio::test]
async fn test_suggest_does_not_advance_editor_sequence() {
    let metadata =
        JqlMetadata::from_json(include_str!("../../jql/tests/fixtures/metadata.json")).unwrap();
    let session = Arc::new(AutoComplete::new(metadata, StaticValueLookup::new()));
    let server = TestServer::new(jql_server::create_routes(session.clone())).unwrap();

    server
        .get("/jql/suggest")
        .add_query_param("jql", "status = ")
        .await
        .assert_status_ok();
    assert_eq!(session.sequence(), 0);
}

#[tokio::test]
async fn test_complete_field() {
    let server = create_test_server();

    let response = server
        .post("/jql/complete")
        .json(&json!({ "jql": "sta = Open", "caret": 3, "value": "status" }))
        .await;

    response.assert_status_ok();
    let completion: Value = response.json();
    assert_eq!(completion["text"], "status = Open");
    assert_eq!(completion["caret"], 6);
    assert_eq!(completion["valid"], true);
}

#[tokio::test]
async fn test_complete_replaces_selection() {
    let server = create_test_server();

    let response = server
        .post("/jql/complete")
        .json(&json!({
            "jql": "status = Open",
            "caret": 9,
            "selectionEnd": 13,
            "value": "\"In Progress\""
        }))
        .await;

    response.assert_status_ok();
    let completion: Value = response.json();
    assert_eq!(completion["text"], "status = \"In Progress\"");
    assert_eq!(completion["caret"], 22);
}

#[tokio::test]
async fn test_complete_rejects_selection_past_end() {
    let server = create_test_server();

    let response = server
        .post("/jql/complete")
        .json(&json!({ "jql": "sta", "caret": 0, "selectionEnd": 9, "value": "status" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_complete_requires_value() {
    let server = create_test_server();

    let response = server
        .post("/jql/complete")
        .json(&json!({ "jql": "sta", "caret": 3 }))
        .await;

    assert!(response.status_code().is_client_error());
}
