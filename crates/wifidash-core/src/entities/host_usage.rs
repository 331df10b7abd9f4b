//! Per-host data usage.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, float_field, EntityBuilder};
use crate::error::CoreResult;
use crate::query::{FluxQuery, TimeRange};
use crate::row::{Row, Scalar};
use crate::store::TelemetryStore;

pub const MEASUREMENT: &str = "host_usage";

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostUsage {
    pub hostname: String,
    pub data_usage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostSort {
    #[default]
    Desc,
    Asc,
}

pub struct HostUsageBuilder {
    hostname: String,
    data_usage: Option<Scalar>,
}

impl EntityBuilder for HostUsageBuilder {
    type Key = String;
    type Output = HostUsage;
    const MEASUREMENT: &'static str = MEASUREMENT;

    /// Only `dataUsage` samples create a host; hosts that reported nothing
    /// else are never listed.
    fn key(row: &Row) -> CoreResult<Option<String>> {
        if row.field != "dataUsage" {
            return Ok(None);
        }
        Ok(row.tag("hostname").map(str::to_string))
    }

    fn seed(key: &String, _row: &Row) -> Self {
        Self {
            hostname: key.clone(),
            data_usage: None,
        }
    }

    fn apply(&mut self, row: &Row) {
        self.data_usage = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<HostUsage> {
        Ok(HostUsage {
            data_usage: float_field(self.data_usage.as_ref(), "dataUsage")?,
            hostname: self.hostname,
        })
    }
}

pub fn host_usage_query() -> FluxQuery {
    FluxQuery::new(MEASUREMENT, TimeRange::last(Duration::hours(24)))
        .group_by(&["hostname"])
        .last()
}

pub fn sort_hosts(hosts: &mut [HostUsage], sort: HostSort) {
    match sort {
        HostSort::Desc => hosts.sort_by(|a, b| b.data_usage.total_cmp(&a.data_usage)),
        HostSort::Asc => hosts.sort_by(|a, b| a.data_usage.total_cmp(&b.data_usage)),
    }
}

pub async fn fetch_hosts(
    store: &dyn TelemetryStore,
    sort: HostSort,
    limit: usize,
) -> CoreResult<Vec<HostUsage>> {
    let rows = store.query(&host_usage_query()).await?;
    let mut hosts = aggregate::<HostUsageBuilder>(&rows)?;
    sort_hosts(&mut hosts, sort);
    hosts.truncate(limit);
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::store::MemoryStore;

    fn row(host: &str, field: &str, usage: f64) -> Row {
        Row::new(MEASUREMENT, field, Utc::now(), usage).with_tag("hostname", host)
    }

    #[tokio::test]
    async fn top_hosts_by_usage() {
        let store = MemoryStore::new(vec![
            row("netflix.com", "dataUsage", 120.0),
            row("youtube.com", "dataUsage", 340.5),
            row("apple.com", "dataUsage", 12.0),
            row("apple.com", "requests", 9000.0),
        ]);

        let top = fetch_hosts(&store, HostSort::Desc, 2).await.expect("fetch");
        let names: Vec<_> = top.iter().map(|h| h.hostname.as_str()).collect();
        assert_eq!(names, ["youtube.com", "netflix.com"]);

        let bottom = fetch_hosts(&store, HostSort::Asc, 1).await.expect("fetch");
        assert_eq!(bottom[0].hostname, "apple.com");
        assert_eq!(bottom[0].data_usage, 12.0);
    }

    #[tokio::test]
    async fn hosts_without_usage_are_left_out() {
        let store = MemoryStore::new(vec![
            row("a.com", "dataUsage", 5.0),
            row("b.com", "requests", 9.0),
        ]);
        let hosts = fetch_hosts(&store, HostSort::Asc, 10).await.expect("fetch");
        assert_eq!(
            hosts,
            [HostUsage {
                hostname: "a.com".to_string(),
                data_usage: 5.0,
            }]
        );
    }
}
