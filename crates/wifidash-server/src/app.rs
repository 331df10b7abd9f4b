use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Dashboard endpoints, relative to the API prefix.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/venue", get(routes::venue::get_venue))
        .route(
            "/zones/{zone_id}/aps",
            get(routes::access_points::get_access_points),
        )
        .route("/clients", get(routes::clients::get_clients))
        .route("/anomalies", get(routes::anomalies::get_anomalies))
        .route("/cause-codes", get(routes::cause_codes::get_cause_codes))
        .route("/hosts", get(routes::hosts::get_hosts))
        .route(
            "/os-distribution",
            get(routes::os_distribution::get_os_distribution),
        )
        .route("/load", get(routes::load::get_load))
        .route("/time-series", get(routes::time_series::get_time_series))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// The dashboard API is mounted under the configured prefix. `/` and
/// `/health` are always served at the root as well.
pub fn build_app(state: Arc<AppState>) -> Router {
    let prefix = state.config.api_prefix.clone();
    let router = Router::new().route("/", get(routes::health::root));
    let router = if prefix.is_empty() {
        router.merge(api_routes())
    } else {
        router
            .route("/health", get(routes::health::health))
            .nest(&prefix, api_routes())
    };

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
