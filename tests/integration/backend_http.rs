//! Integration tests for the development backend's HTTP surface.
//!
//! Speaks raw HTTP to an in-process server and checks the PostgREST-style
//! contract the client relies on: auth, query shapes, status codes, error
//! bodies.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use tasklist_backend::server::{self, BackendState};

const KEY: &str = "http-test-key";

async fn start() -> (Arc<BackendState>, String) {
    let state = Arc::new(BackendState::new(KEY));
    let (addr, _handle) = server::start_server("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start backend");
    (state, format!("http://{addr}"))
}

fn authed(client: &Client, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
    client
        .request(method, url)
        .header("apikey", KEY)
        .bearer_auth(KEY)
}

async fn insert(client: &Client, base: &str, text: &str) -> Value {
    let response = authed(client, reqwest::Method::POST, &format!("{base}/rest/v1/tasks"))
        .header("prefer", "return=representation")
        .json(&json!([{ "text": text, "done": false, "priority": "medium" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let mut rows: Vec<Value> = response.json().await.unwrap();
    assert_eq!(rows.len(), 1);
    rows.remove(0)
}

#[tokio::test]
async fn health_needs_no_key() {
    let (_state, base) = start().await;
    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn missing_key_is_401_with_message() {
    let (_state, base) = start().await;
    let response = Client::new()
        .get(format!("{base}/rest/v1/tasks"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("api key"));
}

#[tokio::test]
async fn insert_echoes_representation() {
    let (_state, base) = start().await;
    let client = Client::new();
    let row = insert(&client, &base, "  padded  ").await;
    assert_eq!(row["id"], 1);
    assert_eq!(row["text"], "padded");
    assert_eq!(row["done"], false);
    assert_eq!(row["priority"], "medium");
    assert!(row["created_at"].is_string());
}

#[tokio::test]
async fn insert_without_prefer_returns_no_rows() {
    let (state, base) = start().await;
    let response = authed(&Client::new(), reqwest::Method::POST, &format!("{base}/rest/v1/tasks"))
        .json(&json!({ "text": "quiet", "done": false, "priority": "low" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.bytes().await.unwrap().is_empty());
    assert_eq!(state.table.len().await, 1);
}

#[tokio::test]
async fn blank_or_bad_rows_are_400() {
    let (state, base) = start().await;
    let client = Client::new();
    for body in [
        json!([{ "text": "   ", "done": false, "priority": "low" }]),
        json!([{ "text": "x", "done": false, "priority": "urgent" }]),
        json!([{ "done": false, "priority": "low" }]),
        json!([]),
    ] {
        let response = authed(&client, reqwest::Method::POST, &format!("{base}/rest/v1/tasks"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
    assert!(state.table.is_empty().await);
}

#[tokio::test]
async fn select_honours_order() {
    let (_state, base) = start().await;
    let client = Client::new();
    insert(&client, &base, "older").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    insert(&client, &base, "newer").await;

    let url = format!("{base}/rest/v1/tasks");
    let desc: Vec<Value> = authed(&client, reqwest::Method::GET, &url)
        .query(&[("select", "id,text,done,priority,created_at"), ("order", "created_at.desc")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(desc[0]["text"], "newer");

    let asc: Vec<Value> = authed(&client, reqwest::Method::GET, &url)
        .query(&[("order", "created_at.asc")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(asc[0]["text"], "older");

    let bad = authed(&client, reqwest::Method::GET, &url)
        .query(&[("order", "text.desc")])
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_and_delete_need_id_filter() {
    let (state, base) = start().await;
    let client = Client::new();
    let row = insert(&client, &base, "target").await;
    let url = format!("{base}/rest/v1/tasks");

    let unfiltered = authed(&client, reqwest::Method::PATCH, &url)
        .json(&json!({ "done": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(unfiltered.status(), StatusCode::BAD_REQUEST);

    let filter = format!("eq.{}", row["id"]);
    let patched = authed(&client, reqwest::Method::PATCH, &url)
        .query(&[("id", filter.as_str())])
        .header("prefer", "return=minimal")
        .json(&json!({ "done": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(patched.status(), StatusCode::NO_CONTENT);

    let unfiltered = authed(&client, reqwest::Method::DELETE, &url)
        .send()
        .await
        .unwrap();
    assert_eq!(unfiltered.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.table.len().await, 1);

    let deleted = authed(&client, reqwest::Method::DELETE, &url)
        .query(&[("id", filter.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert!(state.table.is_empty().await);
}
