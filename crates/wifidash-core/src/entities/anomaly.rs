//! Detected anomalies, deduplicated by anomaly id.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, text_field, EntityBuilder};
use crate::error::CoreResult;
use crate::query::{FluxQuery, TimeRange};
use crate::row::{Row, Scalar};
use crate::store::TelemetryStore;

pub const MEASUREMENT: &str = "anomalies";

pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub description: String,
    pub affected_zone: String,
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Sort rank of a severity label; unknown labels sort last.
pub fn severity_rank(severity: &str) -> u8 {
    match severity {
        "critical" => 0,
        "major" => 1,
        "warning" => 2,
        "info" => 3,
        _ => 9,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnomalySort {
    /// Newest first.
    #[default]
    Timestamp,
    Severity,
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyFilter {
    pub severity: Option<Severity>,
    pub zone_id: Option<String>,
}

pub struct AnomalyBuilder {
    id: String,
    timestamp: DateTime<Utc>,
    tags: BTreeMap<String, String>,
    description: Option<Scalar>,
    metric: Option<Scalar>,
    value: Option<Scalar>,
}

impl AnomalyBuilder {
    fn tag(&self, key: &str) -> Option<Scalar> {
        self.tags.get(key).map(|v| Scalar::from(v.as_str()))
    }
}

impl EntityBuilder for AnomalyBuilder {
    type Key = String;
    type Output = Anomaly;
    const MEASUREMENT: &'static str = MEASUREMENT;

    fn key(row: &Row) -> CoreResult<Option<String>> {
        Ok(row.tag("anomalyId").map(str::to_string))
    }

    fn seed(key: &String, row: &Row) -> Self {
        Self {
            id: key.clone(),
            timestamp: row.time,
            tags: row.tags.clone(),
            description: None,
            metric: None,
            value: None,
        }
    }

    fn apply(&mut self, row: &Row) {
        if row.time >= self.timestamp {
            self.timestamp = row.time;
            self.tags.clone_from(&row.tags);
        }
        let slot = match row.field.as_str() {
            "description" => &mut self.description,
            "metric" => &mut self.metric,
            "value" => &mut self.value,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<Anomaly> {
        Ok(Anomaly {
            kind: text_field(self.tag("type").as_ref(), "None"),
            severity: text_field(self.tag("severity").as_ref(), "None"),
            affected_zone: text_field(self.tag("affectedZone").as_ref(), ""),
            description: text_field(self.description.as_ref(), ""),
            metric: text_field(self.metric.as_ref(), ""),
            value: self.value.as_ref().map(|v| v.to_f64("value")).transpose()?,
            id: self.id,
            timestamp: self.timestamp,
        })
    }
}

pub fn anomaly_query(filter: &AnomalyFilter) -> CoreResult<FluxQuery> {
    Ok(
        FluxQuery::new(MEASUREMENT, TimeRange::last(Duration::days(7)))
            .filter_eq("severity", filter.severity.map(Severity::as_str))?
            .filter_eq("zoneId", filter.zone_id.as_deref())
            .map_err(|e| e.for_param("zoneId"))?
            .group_by(&["anomalyId"])
            .last(),
    )
}

pub fn sort_anomalies(anomalies: &mut [Anomaly], sort: AnomalySort) {
    match sort {
        AnomalySort::Timestamp => anomalies.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        AnomalySort::Severity => anomalies.sort_by_key(|a| severity_rank(&a.severity)),
    }
}

pub async fn fetch_anomalies(
    store: &dyn TelemetryStore,
    filter: &AnomalyFilter,
    sort: AnomalySort,
    limit: usize,
) -> CoreResult<Vec<Anomaly>> {
    let rows = store.query(&anomaly_query(filter)?).await?;
    let mut anomalies = aggregate::<AnomalyBuilder>(&rows)?;
    sort_anomalies(&mut anomalies, sort);
    anomalies.truncate(limit);
    Ok(anomalies)
}
