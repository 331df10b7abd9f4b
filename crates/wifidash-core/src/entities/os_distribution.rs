//! Share of connected clients per operating system.

use serde::Serialize;

use crate::assemble::{os_color, round2};
use crate::entities::client::{fetch_all_clients, Client, ClientFilter};
use crate::error::CoreResult;
use crate::store::TelemetryStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsDistribution {
    pub os: String,
    pub percentage: f64,
    pub color: String,
}

/// One count per client. Percentages are rounded to two decimals and sorted
/// descending; ties keep first-seen order.
pub fn os_distribution(clients: &[Client]) -> Vec<OsDistribution> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for client in clients {
        match counts.iter_mut().find(|(os, _)| *os == client.os) {
            Some((_, n)) => *n += 1,
            None => counts.push((client.os.as_str(), 1)),
        }
    }

    let total = clients.len();
    if total == 0 {
        return Vec::new();
    }

    let mut out: Vec<OsDistribution> = counts
        .into_iter()
        .map(|(os, n)| OsDistribution {
            os: os.to_string(),
            percentage: round2(n as f64 / total as f64 * 100.0),
            color: os_color(os).to_string(),
        })
        .collect();
    out.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    out
}

pub async fn fetch_os_distribution(store: &dyn TelemetryStore) -> CoreResult<Vec<OsDistribution>> {
    let clients = fetch_all_clients(store, &ClientFilter::default()).await?;
    Ok(os_distribution(&clients))
}
