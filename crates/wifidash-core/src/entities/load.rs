//! Frequency band load over time.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::aggregate::{aggregate, EntityBuilder};
use crate::assemble::{band_color, BAND_LABELS};
use crate::error::{CoreError, CoreResult};
use crate::query::{FluxQuery, TimeRange};
use crate::row::{Row, Scalar};
use crate::store::TelemetryStore;

pub const MEASUREMENT: &str = "band_load";

pub const MAX_HOURS: u32 = 24;

const UNTAGGED_BAND: &str = "None";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDataPoint {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "band24G")]
    pub band_24g: f64,
    #[serde(rename = "band5G")]
    pub band_5g: f64,
    #[serde(rename = "band6G5G")]
    pub band_6g_5g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandData {
    pub band: String,
    pub color: String,
    pub data: Vec<LoadDataPoint>,
}

impl BandData {
    fn empty(band: &str) -> Self {
        Self {
            band: band.to_string(),
            color: band_color(band).to_string(),
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub bands: Vec<BandData>,
}

#[derive(Default)]
struct PointBuilder {
    band_24g: Option<Scalar>,
    band_5g: Option<Scalar>,
    band_6g_5g: Option<Scalar>,
}

pub struct BandBuilder {
    band: String,
    points: BTreeMap<DateTime<Utc>, PointBuilder>,
}

impl EntityBuilder for BandBuilder {
    type Key = String;
    type Output = BandData;
    const MEASUREMENT: &'static str = MEASUREMENT;

    /// Untagged rows are bucketed under the label `None`.
    fn key(row: &Row) -> CoreResult<Option<String>> {
        Ok(Some(row.tag("band").unwrap_or(UNTAGGED_BAND).to_string()))
    }

    fn seed(key: &String, _row: &Row) -> Self {
        Self {
            band: key.clone(),
            points: BTreeMap::new(),
        }
    }

    fn apply(&mut self, row: &Row) {
        let point = self.points.entry(row.time).or_default();
        let slot = match row.field.as_str() {
            "band24G" => &mut point.band_24g,
            "band5G" => &mut point.band_5g,
            "band6G5G" => &mut point.band_6g_5g,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<BandData> {
        let load = |v: Option<Scalar>, field: &str| v.map_or(Ok(0.0), |v| v.to_f64(field));
        let data = self
            .points
            .into_iter()
            .map(|(timestamp, p)| -> CoreResult<LoadDataPoint> {
                Ok(LoadDataPoint {
                    timestamp,
                    band_24g: load(p.band_24g, "band24G")?,
                    band_5g: load(p.band_5g, "band5G")?,
                    band_6g_5g: load(p.band_6g_5g, "band6G5G")?,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(BandData {
            color: band_color(&self.band).to_string(),
            band: self.band,
            data,
        })
    }
}

/// The three standard bands always come first, in fixed order, even when no
/// rows reported them. Other labels follow in first-seen order.
pub fn assemble_bands(rows: &[Row]) -> CoreResult<Vec<BandData>> {
    let mut bands: Vec<BandData> = BAND_LABELS.iter().map(|b| BandData::empty(b)).collect();
    for band in aggregate::<BandBuilder>(rows)? {
        match BAND_LABELS.iter().position(|label| *label == band.band) {
            Some(idx) => bands[idx] = band,
            None => bands.push(band),
        }
    }
    Ok(bands)
}

pub fn load_query(hours: u32, zone_id: Option<&str>) -> CoreResult<FluxQuery> {
    if !(1..=MAX_HOURS).contains(&hours) {
        return Err(CoreError::InvalidFilter {
            field: "hours".to_string(),
            reason: format!("must be between 1 and {MAX_HOURS}"),
        });
    }
    FluxQuery::new(MEASUREMENT, TimeRange::last(Duration::hours(i64::from(hours))))
        .filter_eq("zoneId", zone_id)
}

pub async fn fetch_load(
    store: &dyn TelemetryStore,
    hours: u32,
    zone_id: Option<&str>,
) -> CoreResult<LoadResponse> {
    let rows = store.query(&load_query(hours, zone_id)?).await?;
    Ok(LoadResponse {
        bands: assemble_bands(&rows)?,
    })
}
