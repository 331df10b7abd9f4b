//! Windowed metric series for one or more zones.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::query::{Filter, FluxQuery, TimeRange};
use crate::row::Row;
use crate::store::TelemetryStore;

pub const MEASUREMENT: &str = "metrics";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub zone: String,
}

#[derive(Debug, Clone)]
pub struct TimeSeriesRequest {
    pub metric: String,
    pub zone_ids: Vec<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Window width in minutes. Also the default lookback in hours.
    pub interval: u32,
}

impl TimeSeriesRequest {
    /// Parse a comma-separated zone list; blanks are dropped.
    pub fn split_zone_ids(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|z| !z.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn time_series_query(req: &TimeSeriesRequest) -> CoreResult<FluxQuery> {
    if req.metric.trim().is_empty() {
        return Err(CoreError::InvalidFilter {
            field: "metric".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if req.interval == 0 {
        return Err(CoreError::InvalidFilter {
            field: "interval".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if let (Some(start), Some(end)) = (req.start, req.end) {
        if start > end {
            return Err(CoreError::InvalidFilter {
                field: "startTime".to_string(),
                reason: "must not be after endTime".to_string(),
            });
        }
    }

    let range = TimeRange::between(
        req.start,
        req.end,
        Duration::hours(i64::from(req.interval.max(1))),
    );
    let mut query = FluxQuery::new(MEASUREMENT, range)
        .filter(Filter::equals("metric", &req.metric)?)
        .window_mean(req.interval);
    if !req.zone_ids.is_empty() {
        query = query.filter(
            Filter::one_of("zoneId", req.zone_ids.iter().cloned())
                .map_err(|e| e.for_param("zoneIds"))?,
        );
    }
    Ok(query)
}

/// Points of the `value` field, oldest first.
pub fn assemble_points(rows: &[Row]) -> CoreResult<Vec<TimeSeriesPoint>> {
    let mut points = rows
        .iter()
        .filter(|row| row.measurement == MEASUREMENT && row.field == "value")
        .map(|row| -> CoreResult<TimeSeriesPoint> {
            Ok(TimeSeriesPoint {
                timestamp: row.time,
                value: row.value.to_f64("value")?,
                zone: row
                    .tag("zoneName")
                    .or_else(|| row.tag("zoneId"))
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

pub async fn fetch_time_series(
    store: &dyn TelemetryStore,
    req: &TimeSeriesRequest,
) -> CoreResult<Vec<TimeSeriesPoint>> {
    let rows = store.query(&time_series_query(req)?).await?;
    assemble_points(&rows)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn request(metric: &str) -> TimeSeriesRequest {
        TimeSeriesRequest {
            metric: metric.to_string(),
            zone_ids: Vec::new(),
            start: None,
            end: None,
            interval: 1,
        }
    }

    #[test]
    fn default_range_is_interval_hours() {
        let mut req = request("experienceScore");
        req.interval = 3;
        let flux = time_series_query(&req).expect("query").render("b");
        assert!(flux.contains("range(start: -3h, stop: now())"));
        assert!(flux.contains("r[\"metric\"] == \"experienceScore\""));
        assert!(flux.contains("aggregateWindow(every: 3m, fn: mean, createEmpty: false)"));
    }

    #[test]
    fn zone_list_becomes_anchored_match() {
        let mut req = request("utilization");
        req.zone_ids = TimeSeriesRequest::split_zone_ids(" zone-001, ,zone-002 ");
        assert_eq!(req.zone_ids, ["zone-001", "zone-002"]);
        let flux = time_series_query(&req).expect("query").render("b");
        assert!(flux.contains(r#"r["zoneId"] =~ /^(?:zone\-001|zone\-002)$/"#));
    }

    #[test]
    fn rejects_inverted_range_and_zero_interval() {
        let mut req = request("utilization");
        req.start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).single();
        req.end = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single();
        assert!(time_series_query(&req).is_err());

        let mut req = request("utilization");
        req.interval = 0;
        assert!(time_series_query(&req).is_err());

        assert!(time_series_query(&request("  ")).is_err());
    }

    #[test]
    fn points_sorted_and_labelled() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).single().expect("t0");
        let t1 = t0 + Duration::minutes(5);
        let rows = vec![
            Row::new(MEASUREMENT, "value", t1, 81.0).with_tag("zoneId", "zone-001"),
            Row::new(MEASUREMENT, "value", t0, 79.5)
                .with_tag("zoneId", "zone-002")
                .with_tag("zoneName", "Cafe"),
            Row::new(MEASUREMENT, "other", t0, 1.0),
            Row::new(MEASUREMENT, "value", t0, 2_i64),
        ];
        let points = assemble_points(&rows).expect("points");
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].zone, "Cafe");
        assert_eq!(points[1].zone, "");
        assert_eq!(points[1].value, 2.0);
        assert_eq!(points[2].zone, "zone-001");
        assert_eq!(points[2].timestamp, t1);
    }
}
