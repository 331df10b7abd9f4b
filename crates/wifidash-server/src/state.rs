use std::sync::Arc;

use wifidash_core::config::Config;
use wifidash_core::TelemetryStore;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Time-series store. Built once at startup and shared read-only by all
    /// requests.
    pub store: Arc<dyn TelemetryStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn TelemetryStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &dyn TelemetryStore {
        self.store.as_ref()
    }
}
