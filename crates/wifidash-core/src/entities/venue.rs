//! Venue totals and per-zone health.

use chrono::Duration;
use serde::Serialize;

use crate::aggregate::{aggregate, float_field, int_field, text_field, EntityBuilder};
use crate::error::{CoreError, CoreResult};
use crate::query::{FluxQuery, TimeRange};
use crate::row::{Row, Scalar};
use crate::store::TelemetryStore;

pub const VENUE_MEASUREMENT: &str = "venue_metrics";
pub const ZONE_MEASUREMENT: &str = "zone_metrics";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(rename = "totalAPs")]
    pub total_aps: i64,
    #[serde(rename = "connectedAPs")]
    pub connected_aps: i64,
    #[serde(rename = "disconnectedAPs")]
    pub disconnected_aps: i64,
    pub clients: i64,
    pub ap_availability: f64,
    #[serde(rename = "clientsPerAP")]
    pub clients_per_ap: f64,
    pub experience_score: f64,
    pub utilization: f64,
    pub rx_desense: f64,
    pub netflix_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub name: String,
    pub total_zones: i64,
    #[serde(rename = "totalAPs")]
    pub total_aps: i64,
    pub total_clients: i64,
    pub avg_experience_score: f64,
    pub sla_compliance: f64,
    pub zones: Vec<Zone>,
}

#[derive(Default)]
pub struct ZoneBuilder {
    id: String,
    name: Option<Scalar>,
    total_aps: Option<Scalar>,
    connected_aps: Option<Scalar>,
    disconnected_aps: Option<Scalar>,
    clients: Option<Scalar>,
    ap_availability: Option<Scalar>,
    clients_per_ap: Option<Scalar>,
    experience_score: Option<Scalar>,
    utilization: Option<Scalar>,
    rx_desense: Option<Scalar>,
    netflix_score: Option<Scalar>,
}

impl EntityBuilder for ZoneBuilder {
    type Key = String;
    type Output = Zone;
    const MEASUREMENT: &'static str = ZONE_MEASUREMENT;

    fn key(row: &Row) -> CoreResult<Option<String>> {
        Ok(row.tag("zoneId").map(str::to_string))
    }

    fn seed(key: &String, row: &Row) -> Self {
        Self {
            id: key.clone(),
            name: row.tag_scalar("zoneName"),
            ..Self::default()
        }
    }

    fn apply(&mut self, row: &Row) {
        let slot = match row.field.as_str() {
            "totalAPs" => &mut self.total_aps,
            "connectedAPs" => &mut self.connected_aps,
            "disconnectedAPs" => &mut self.disconnected_aps,
            "clients" => &mut self.clients,
            "apAvailability" => &mut self.ap_availability,
            "clientsPerAP" => &mut self.clients_per_ap,
            "experienceScore" => &mut self.experience_score,
            "utilization" => &mut self.utilization,
            "rxDesense" => &mut self.rx_desense,
            "netflixScore" => &mut self.netflix_score,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<Zone> {
        Ok(Zone {
            name: text_field(self.name.as_ref(), &self.id),
            total_aps: int_field(self.total_aps.as_ref(), "totalAPs")?,
            connected_aps: int_field(self.connected_aps.as_ref(), "connectedAPs")?,
            disconnected_aps: int_field(self.disconnected_aps.as_ref(), "disconnectedAPs")?,
            clients: int_field(self.clients.as_ref(), "clients")?,
            ap_availability: float_field(self.ap_availability.as_ref(), "apAvailability")?,
            clients_per_ap: float_field(self.clients_per_ap.as_ref(), "clientsPerAP")?,
            experience_score: float_field(self.experience_score.as_ref(), "experienceScore")?,
            utilization: float_field(self.utilization.as_ref(), "utilization")?,
            rx_desense: float_field(self.rx_desense.as_ref(), "rxDesense")?,
            netflix_score: float_field(self.netflix_score.as_ref(), "netflixScore")?,
            id: self.id,
        })
    }
}

/// Venue-wide totals as last reported. Zone data is attached afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueTotals {
    pub total_zones: Option<i64>,
    pub total_aps: i64,
    pub total_clients: i64,
    pub avg_experience_score: f64,
    pub sla_compliance: f64,
}

#[derive(Default)]
pub struct VenueTotalsBuilder {
    total_zones: Option<Scalar>,
    total_aps: Option<Scalar>,
    total_clients: Option<Scalar>,
    avg_experience_score: Option<Scalar>,
    sla_compliance: Option<Scalar>,
}

impl EntityBuilder for VenueTotalsBuilder {
    /// The store holds one venue; every row folds into the same builder.
    type Key = ();
    type Output = VenueTotals;
    const MEASUREMENT: &'static str = VENUE_MEASUREMENT;

    fn key(_row: &Row) -> CoreResult<Option<()>> {
        Ok(Some(()))
    }

    fn seed(_key: &(), _row: &Row) -> Self {
        Self::default()
    }

    fn apply(&mut self, row: &Row) {
        let slot = match row.field.as_str() {
            "totalZones" => &mut self.total_zones,
            "totalAPs" => &mut self.total_aps,
            "totalClients" => &mut self.total_clients,
            "avgExperienceScore" => &mut self.avg_experience_score,
            "slaCompliance" => &mut self.sla_compliance,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<VenueTotals> {
        Ok(VenueTotals {
            total_zones: self
                .total_zones
                .as_ref()
                .map(|v| v.to_i64("totalZones"))
                .transpose()?,
            total_aps: int_field(self.total_aps.as_ref(), "totalAPs")?,
            total_clients: int_field(self.total_clients.as_ref(), "totalClients")?,
            avg_experience_score: float_field(
                self.avg_experience_score.as_ref(),
                "avgExperienceScore",
            )?,
            sla_compliance: float_field(self.sla_compliance.as_ref(), "slaCompliance")?,
        })
    }
}

/// Combine venue rows and zone rows. No venue rows means no venue.
pub fn assemble_venue(name: &str, venue_rows: &[Row], zone_rows: &[Row]) -> CoreResult<Venue> {
    let totals = aggregate::<VenueTotalsBuilder>(venue_rows)?
        .pop()
        .ok_or_else(|| CoreError::NotFound("no venue data".to_string()))?;

    let mut zones = aggregate::<ZoneBuilder>(zone_rows)?;
    zones.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(Venue {
        name: name.to_string(),
        total_zones: totals.total_zones.unwrap_or(zones.len() as i64),
        total_aps: totals.total_aps,
        total_clients: totals.total_clients,
        avg_experience_score: totals.avg_experience_score,
        sla_compliance: totals.sla_compliance,
        zones,
    })
}

fn window() -> TimeRange {
    TimeRange::last(Duration::hours(2))
}

pub fn venue_query() -> FluxQuery {
    FluxQuery::new(VENUE_MEASUREMENT, window()).last()
}

pub fn zone_query() -> FluxQuery {
    FluxQuery::new(ZONE_MEASUREMENT, window())
        .group_by(&["zoneId"])
        .last()
}

pub async fn fetch_venue(store: &dyn TelemetryStore, name: &str) -> CoreResult<Venue> {
    let venue_rows = store.query(&venue_query()).await?;
    let zone_rows = store.query(&zone_query()).await?;
    assemble_venue(name, &venue_rows, &zone_rows)
}
