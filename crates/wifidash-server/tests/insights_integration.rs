use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use wifidash_core::config::Config;
use wifidash_core::{MemoryStore, Row, Scalar};
use wifidash_server::app::build_app;
use wifidash_server::state::AppState;

async fn get(store: Arc<MemoryStore>, uri: &str) -> (StatusCode, Value) {
    let app = build_app(Arc::new(AppState::new(store, Config::default())));
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    (status, serde_json::from_slice(&bytes).expect("parse JSON"))
}

fn code_row(code: &str, field: &str, value: impl Into<Scalar>) -> Row {
    Row::new("disconnect_codes", field, Utc::now(), value).with_tag("code", code)
}

fn host_row(host: &str, usage: f64) -> Row {
    Row::new("host_usage", "dataUsage", Utc::now(), usage).with_tag("hostname", host)
}

fn client_row(mac: &str, os: &str) -> Row {
    Row::new("client_metrics", "dataUsage", Utc::now(), 1.0)
        .with_tag("macAddress", mac)
        .with_tag("os", os)
}

#[tokio::test]
async fn test_cause_codes_sorted_and_limited() {
    let store = Arc::new(MemoryStore::new(vec![
        code_row("1", "count", 50_i64),
        code_row("1", "description", "Unspecified"),
        code_row("1", "impactScore", 9.5),
        code_row("8", "count", 200_i64),
        code_row("8", "description", "Left BSS"),
        code_row("8", "impactScore", 1.0),
        code_row("4", "count", 10_i64),
    ]));

    let (status, body) = get(Arc::clone(&store), "/api/cause-codes").await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<i64> = body
        .as_array()
        .expect("codes")
        .iter()
        .map(|c| c["code"].as_i64().expect("code"))
        .collect();
    assert_eq!(codes, [8, 1, 4]);
    assert_eq!(body[0]["description"], "Left BSS");
    assert_eq!(body[2]["impactScore"], 0.0);

    let (_, body) = get(store, "/api/cause-codes?sort=impactScore&limit=1").await;
    assert_eq!(body.as_array().expect("codes").len(), 1);
    assert_eq!(body[0]["code"], 1);
}

#[tokio::test]
async fn test_cause_code_bad_tag_is_500() {
    let store = Arc::new(MemoryStore::new(vec![code_row("eight", "count", 2_i64)]));
    let (status, body) = get(store, "/api/cause-codes").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
}

#[tokio::test]
async fn test_hosts_top_and_bottom() {
    let store = Arc::new(MemoryStore::new(vec![
        host_row("netflix.com", 120.0),
        host_row("youtube.com", 340.5),
        host_row("apple.com", 12.0),
        Row::new("host_usage", "requests", Utc::now(), 3.0)
            .with_tag("hostname", "idle.example"),
    ]));

    let (status, body) = get(Arc::clone(&store), "/api/hosts?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("hosts").len(), 2);
    assert_eq!(body[0]["hostname"], "youtube.com");
    assert_eq!(body[0]["dataUsage"], 340.5);

    let (_, body) = get(Arc::clone(&store), "/api/hosts?sort=asc&limit=1").await;
    assert_eq!(body[0]["hostname"], "apple.com");

    let (_, body) = get(Arc::clone(&store), "/api/hosts?limit=10").await;
    assert_eq!(body.as_array().expect("hosts").len(), 3);

    let (status, _) = get(store, "/api/hosts?sort=sideways").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_os_distribution_percentages() {
    let store = Arc::new(MemoryStore::new(vec![
        client_row("m1", "iOS"),
        client_row("m2", "Android"),
        client_row("m3", "iOS"),
    ]));
    let (status, body) = get(store, "/api/os-distribution").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["os"], "iOS");
    assert_eq!(items[0]["percentage"], 66.67);
    assert_eq!(items[1]["os"], "Android");
    assert_eq!(items[1]["percentage"], 33.33);
    assert!(items[0]["color"].as_str().is_some_and(|c| c.starts_with('#')));
}

#[tokio::test]
async fn test_os_distribution_empty() {
    let store = Arc::new(MemoryStore::default());
    let (status, body) = get(store, "/api/os-distribution").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}
