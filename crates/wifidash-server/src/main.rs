use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use wifidash_core::config::Config;
use wifidash_core::TelemetryStore;
use wifidash_influx::InfluxClient;
use wifidash_server::state::AppState;

/// `wifidash health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$WIFIDASH_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("WIFIDASH_PORT").unwrap_or_else(|_| "3001".to_string());
    let url = format!("http://localhost:{port}/health");
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wifidash=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let influx = InfluxClient::from_config(&cfg);
    // A store that is down at boot is not fatal; /health reports it.
    if influx.health().await {
        info!(url = %cfg.influx_url, bucket = %cfg.influx_bucket, "InfluxDB reachable");
    } else {
        warn!(url = %cfg.influx_url, "InfluxDB health check failed; serving anyway");
    }

    let state = Arc::new(AppState::new(Arc::new(influx), cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = wifidash_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, prefix = %cfg.api_prefix, "WiFi dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    drop(state);
    info!("Shutdown complete");

    Ok(())
}
