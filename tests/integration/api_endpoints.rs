//! Integration tests for the control API
//!
//! These tests verify that:
//! - Target lifecycle endpoints drive the engine
//! - Engine errors map to the right status codes
//! - Authentication is enforced everywhere but the health check

use std::net::SocketAddr;

use axum::http::StatusCode;
use feedwatch::api::{ApiConfig, ApiState, spawn_api_server};
use serde_json::{Value, json};

use crate::helpers::*;

const TOKEN: &str = "test-token";

async fn spawn_test_api(steps: Vec<Step>) -> SocketAddr {
    let (engine, _feed, _store) = engine(steps);

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        auth_token: Some(TOKEN.to_string()),
        enable_cors: true,
    };

    spawn_api_server(config, ApiState::new(engine)).await.unwrap()
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn add(addr: SocketAddr, body: Value) -> reqwest::Response {
    client()
        .post(format!("http://{addr}/api/v1/targets"))
        .bearer_auth(TOKEN)
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn post_action(addr: SocketAddr, id: &str, action: &str) -> reqwest::Response {
    client()
        .post(format!("http://{addr}/api/v1/targets/{id}/{action}"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let addr = spawn_test_api(vec![Step::Items(Vec::new())]).await;

    let response = client()
        .get(format!("http://{addr}/api/v1/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"]["healthy"], true);
}

#[tokio::test]
async fn test_auth_required() {
    let addr = spawn_test_api(vec![Step::Items(Vec::new())]).await;
    let url = format!("http://{addr}/api/v1/targets");

    let missing = client().get(&url).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = client().get(&url).bearer_auth("nope").send().await.unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let ok = client().get(&url).bearer_auth(TOKEN).send().await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_target_lifecycle() {
    let addr = spawn_test_api(vec![
        Step::Items(posts(&["a", "b"])),
        Step::Items(posts(&["c", "a", "b"])),
    ])
    .await;

    let created = add(addr, json!({ "name": "u/someone", "kind": "person", "start": true })).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let id = created.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let polled: Value = post_action(addr, &id, "poll").await.json().await.unwrap();
    assert_eq!(polled["outcome"], "applied");
    assert_eq!(polled["new_items"], 1);

    let target: Value = client()
        .get(format!("http://{addr}/api/v1/targets/{id}"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(target["display_name"], "u/someone");
    assert_eq!(target["is_monitoring"], true);
    assert_eq!(target["activities"].as_array().unwrap().len(), 3);
    assert_eq!(target["activity_summary"]["type"], "by_kind");

    let stopped = post_action(addr, &id, "stop").await;
    assert_eq!(stopped.status(), StatusCode::OK);
    let stopped: Value = stopped.json().await.unwrap();
    assert_eq!(stopped["session"]["new_activity_count"], 1);
    let session_id = stopped["session"]["session_id"].as_str().unwrap().to_string();

    let again: Value = post_action(addr, &id, "stop").await.json().await.unwrap();
    assert!(again["session"].is_null());

    let sessions: Value = client()
        .get(format!("http://{addr}/api/v1/sessions"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sessions["count"], 1);

    let loaded = client()
        .post(format!("http://{addr}/api/v1/sessions/{session_id}/load"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(loaded.status(), StatusCode::CREATED);

    let listed: Value = client()
        .get(format!("http://{addr}/api/v1/targets"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["count"], 2);
    assert_eq!(listed["max_targets"], 5);

    let restarted = post_action(addr, &id, "restart").await;
    assert_eq!(restarted.status(), StatusCode::OK);

    let removed = client()
        .delete(format!("http://{addr}/api/v1/targets/{id}"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_error_status_codes() {
    let addr = spawn_test_api(vec![Step::Items(Vec::new())]).await;

    assert_eq!(
        add(addr, json!({ "name": "rust", "kind": "group" })).await.status(),
        StatusCode::CREATED
    );
    assert_eq!(
        add(addr, json!({ "name": "r/Rust", "kind": "group" })).await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        add(addr, json!({ "name": "  ", "kind": "group" })).await.status(),
        StatusCode::BAD_REQUEST
    );

    for name in ["two", "three", "four", "five"] {
        add(addr, json!({ "name": name, "kind": "group" })).await;
    }
    assert_eq!(
        add(addr, json!({ "name": "six", "kind": "group" })).await.status(),
        StatusCode::CONFLICT
    );

    let unknown = uuid::Uuid::new_v4().to_string();
    assert_eq!(
        post_action(addr, &unknown, "start").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        post_action(addr, "not-a-uuid", "start").await.status(),
        StatusCode::BAD_REQUEST
    );

    let missing_session = client()
        .post(format!("http://{addr}/api/v1/sessions/{unknown}/load"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(missing_session.status(), StatusCode::NOT_FOUND);
}
