use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health`: reachability of the time-series store.
///
/// Always `200 OK`; a store outage is reported in the body:
/// ```json
/// { "status": "degraded", "database": "disconnected" }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let connected = state.store.health().await;
    if !connected {
        tracing::warn!("Health check: time-series store unreachable");
    }
    Json(json!({
        "status": if connected { "healthy" } else { "degraded" },
        "database": if connected { "connected" } else { "disconnected" },
    }))
}

/// `GET /`: service banner.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "WiFi Dashboard API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
