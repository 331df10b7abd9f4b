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

fn client(i: usize, zone: &str, ap: &str) -> Vec<Row> {
    let mac = format!("cc:{i:02}");
    let row = |field: &str, value: Scalar| {
        Row::new("client_metrics", field, Utc::now(), value)
            .with_tag("macAddress", mac.as_str())
            .with_tag("apMac", ap)
            .with_tag("apName", format!("AP-{ap}"))
            .with_tag("zoneId", zone)
            .with_tag("wlan", "Guest")
            .with_tag("os", if i % 3 == 0 { "Android" } else { "iOS" })
            .with_tag("deviceType", "phone")
    };
    vec![
        row("hostname", Scalar::from(format!("device-{i:02}"))),
        row("ipAddress", Scalar::from(format!("10.1.0.{i}"))),
        row("dataUsage", Scalar::Float(i as f64 * 10.0)),
    ]
}

fn fixture() -> Vec<Row> {
    (0..25)
        .flat_map(|i| {
            let zone = if i < 20 { "zone-001" } else { "zone-002" };
            let ap = if i % 2 == 0 { "aa:01" } else { "aa:02" };
            client(i, zone, ap)
        })
        .collect()
}

#[tokio::test]
async fn test_clients_last_page() {
    let store = Arc::new(MemoryStore::new(fixture()));
    let (status, body) = get(store, "/api/clients?limit=10&offset=20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("data").len(), 5);
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["offset"], 20);
    assert_eq!(body["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn test_clients_default_page_sorted_by_usage() {
    let store = Arc::new(MemoryStore::new(fixture()));
    let (status, body) = get(store, "/api/clients?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["hasMore"], true);
    let data = body["data"].as_array().expect("data");
    assert_eq!(data[0]["macAddress"], "cc:24");
    assert_eq!(data[0]["dataUsage"], 240.0);
    assert_eq!(data[0]["hostname"], "device-24");
    assert_eq!(data[0]["modelName"], "Unknown");
    assert_eq!(data[0]["wlan"], "Guest");
}

#[tokio::test]
async fn test_clients_filtered_by_zone_and_ap() {
    let store = Arc::new(MemoryStore::new(fixture()));
    let (status, body) = get(
        Arc::clone(&store),
        "/api/clients?zoneId=zone-002&apId=aa:01&sort=hostname",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hosts: Vec<&str> = body["data"]
        .as_array()
        .expect("data")
        .iter()
        .map(|c| c["hostname"].as_str().expect("hostname"))
        .collect();
    assert_eq!(hosts, ["device-20", "device-22", "device-24"]);

    let flux = store.queries()[0].render("wifi-streaming");
    assert!(flux.contains(r#"r["zoneId"] == "zone-002" and r["apMac"] == "aa:01""#));
}

#[tokio::test]
async fn test_clients_unknown_sort_is_422() {
    let store = Arc::new(MemoryStore::new(fixture()));
    let (status, body) = get(store, "/api/clients?sort=size").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Invalid request parameters");
    assert_eq!(body["error"]["details"][0]["field"], "sort");
}

#[tokio::test]
async fn test_clients_negative_limit_is_422() {
    let store = Arc::new(MemoryStore::new(fixture()));
    let (status, body) = get(store, "/api/clients?limit=-1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "limit");
}
