//! Time-series store abstraction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::Utc;

use crate::query::{FluxQuery, RangeStart, RangeStop};
use crate::row::Row;

/// Executes structured queries and returns normalized rows.
///
/// Implementations own the rendering of [`FluxQuery`] into their query
/// language. A single instance is shared by every request.
#[async_trait::async_trait]
pub trait TelemetryStore: Send + Sync + 'static {
    async fn query(&self, query: &FluxQuery) -> Result<Vec<Row>>;

    /// Liveness of the backing database. Never errors.
    async fn health(&self) -> bool;
}

/// In-process store over a fixed row set.
///
/// Applies the measurement, tag filters and time range of each query but
/// performs no reduction: rows come back in insertion order. Used by tests
/// and local development.
#[derive(Default)]
pub struct MemoryStore {
    rows: Vec<Row>,
    seen: Mutex<Vec<FluxQuery>>,
    unhealthy: AtomicBool,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    /// Make every subsequent query fail with an upstream error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<FluxQuery> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }

    fn in_range(query: &FluxQuery, row: &Row) -> bool {
        let now = Utc::now();
        let start = match &query.range.start {
            RangeStart::Relative(lookback) => now - *lookback,
            RangeStart::Absolute(at) => *at,
        };
        let stop = match &query.range.stop {
            Some(RangeStop::Absolute(at)) => Some(*at),
            Some(RangeStop::Now) | None => None,
        };
        row.time >= start && stop.map_or(true, |stop| row.time < stop)
    }
}

#[async_trait::async_trait]
impl TelemetryStore for MemoryStore {
    async fn query(&self, query: &FluxQuery) -> Result<Vec<Row>> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(query.clone());
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("memory store configured to fail"));
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| row.measurement == query.measurement)
            .filter(|row| query.filters.iter().all(|f| f.matches(&row.tags)))
            .filter(|row| Self::in_range(query, row))
            .cloned()
            .collect())
    }

    async fn health(&self) -> bool {
        !self.unhealthy.load(Ordering::SeqCst)
    }
}
