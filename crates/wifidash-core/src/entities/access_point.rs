//! Access points of a zone, each with its radios nested.

use chrono::Duration;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{int_field, text_field, EntityBuilder, Folder};
use crate::error::CoreResult;
use crate::query::{Filter, FluxQuery, TimeRange};
use crate::row::{Row, Scalar};
use crate::store::TelemetryStore;

pub const AP_MEASUREMENT: &str = "ap_metrics";
pub const RADIO_MEASUREMENT: &str = "radio_metrics";

/// Text shown for an access point attribute that was never reported.
const UNREPORTED: &str = "None";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Radio {
    pub band: String,
    pub channel: i64,
    pub tx_power: i64,
    pub noise_floor: i64,
    pub client_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    pub mac: String,
    pub name: String,
    pub model: String,
    pub status: String,
    pub ip: String,
    pub zone_id: String,
    pub zone_name: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub client_count: i64,
    pub channel_utilization: i64,
    pub airtime_utilization: i64,
    pub cpu_utilization: i64,
    pub memory_utilization: i64,
    pub radios: Vec<Radio>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessPointList {
    pub total: usize,
    pub list: Vec<AccessPoint>,
}

pub struct RadioBuilder {
    band: String,
    channel: Option<Scalar>,
    tx_power: Option<Scalar>,
    noise_floor: Option<Scalar>,
    client_count: Option<Scalar>,
}

impl EntityBuilder for RadioBuilder {
    type Key = (String, String);
    type Output = Radio;
    const MEASUREMENT: &'static str = RADIO_MEASUREMENT;

    fn key(row: &Row) -> CoreResult<Option<Self::Key>> {
        Ok(row
            .tag("apMac")
            .zip(row.tag("band"))
            .map(|(mac, band)| (mac.to_string(), band.to_string())))
    }

    fn seed((_, band): &Self::Key, _row: &Row) -> Self {
        Self {
            band: band.clone(),
            channel: None,
            tx_power: None,
            noise_floor: None,
            client_count: None,
        }
    }

    fn apply(&mut self, row: &Row) {
        let slot = match row.field.as_str() {
            "channel" => &mut self.channel,
            "txPower" => &mut self.tx_power,
            "noiseFloor" => &mut self.noise_floor,
            "clientCount" => &mut self.client_count,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<Radio> {
        Ok(Radio {
            channel: int_field(self.channel.as_ref(), "channel")?,
            tx_power: int_field(self.tx_power.as_ref(), "txPower")?,
            noise_floor: int_field(self.noise_floor.as_ref(), "noiseFloor")?,
            client_count: int_field(self.client_count.as_ref(), "clientCount")?,
            band: self.band,
        })
    }
}

pub struct AccessPointBuilder {
    mac: String,
    name: Option<Scalar>,
    model: Option<Scalar>,
    status: Option<Scalar>,
    ip: Option<Scalar>,
    zone_id: Option<Scalar>,
    zone_name: Option<Scalar>,
    firmware_version: Option<Scalar>,
    serial_number: Option<Scalar>,
    client_count: Option<Scalar>,
    channel_utilization: Option<Scalar>,
    airtime_utilization: Option<Scalar>,
    cpu_utilization: Option<Scalar>,
    memory_utilization: Option<Scalar>,
    radios: Vec<RadioBuilder>,
}

impl EntityBuilder for AccessPointBuilder {
    type Key = String;
    type Output = AccessPoint;
    const MEASUREMENT: &'static str = AP_MEASUREMENT;

    fn key(row: &Row) -> CoreResult<Option<String>> {
        Ok(row.tag("apMac").map(str::to_string))
    }

    fn seed(key: &String, row: &Row) -> Self {
        Self {
            mac: key.clone(),
            name: row.tag_scalar("apName"),
            model: row.tag_scalar("model"),
            status: row.tag_scalar("status"),
            ip: row.tag_scalar("ip"),
            zone_id: row.tag_scalar("zoneId"),
            zone_name: row.tag_scalar("zoneName"),
            firmware_version: None,
            serial_number: None,
            client_count: None,
            channel_utilization: None,
            airtime_utilization: None,
            cpu_utilization: None,
            memory_utilization: None,
            radios: Vec::new(),
        }
    }

    fn apply(&mut self, row: &Row) {
        let slot = match row.field.as_str() {
            "apName" => &mut self.name,
            "model" => &mut self.model,
            "status" => &mut self.status,
            "ip" => &mut self.ip,
            "zoneId" => &mut self.zone_id,
            "zoneName" => &mut self.zone_name,
            "firmwareVersion" => &mut self.firmware_version,
            "serialNumber" => &mut self.serial_number,
            "clientCount" => &mut self.client_count,
            "channelUtilization" => &mut self.channel_utilization,
            "airtimeUtilization" => &mut self.airtime_utilization,
            "cpuUtilization" => &mut self.cpu_utilization,
            "memoryUtilization" => &mut self.memory_utilization,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<AccessPoint> {
        let radios = self
            .radios
            .into_iter()
            .map(RadioBuilder::finish)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(AccessPoint {
            name: text_field(self.name.as_ref(), UNREPORTED),
            model: text_field(self.model.as_ref(), UNREPORTED),
            status: text_field(self.status.as_ref(), UNREPORTED),
            ip: text_field(self.ip.as_ref(), UNREPORTED),
            zone_id: text_field(self.zone_id.as_ref(), UNREPORTED),
            zone_name: text_field(self.zone_name.as_ref(), UNREPORTED),
            firmware_version: text_field(self.firmware_version.as_ref(), UNREPORTED),
            serial_number: text_field(self.serial_number.as_ref(), UNREPORTED),
            client_count: int_field(self.client_count.as_ref(), "clientCount")?,
            channel_utilization: int_field(
                self.channel_utilization.as_ref(),
                "channelUtilization",
            )?,
            airtime_utilization: int_field(
                self.airtime_utilization.as_ref(),
                "airtimeUtilization",
            )?,
            cpu_utilization: int_field(self.cpu_utilization.as_ref(), "cpuUtilization")?,
            memory_utilization: int_field(
                self.memory_utilization.as_ref(),
                "memoryUtilization",
            )?,
            mac: self.mac,
            radios,
        })
    }
}

/// Fold AP rows and radio rows into access points. Radios whose AP has no
/// row of its own are dropped.
pub fn aggregate_access_points(ap_rows: &[Row], radio_rows: &[Row]) -> CoreResult<Vec<AccessPoint>> {
    let mut aps = Folder::<AccessPointBuilder>::new();
    aps.extend(ap_rows)?;

    let mut radios = Folder::<RadioBuilder>::new();
    radios.extend(radio_rows)?;

    for ((mac, band), radio) in radios.into_builders() {
        match aps.get_mut(&mac) {
            Some(ap) => ap.radios.push(radio),
            None => debug!(ap_mac = %mac, band = %band, "dropping radio of unknown access point"),
        }
    }

    aps.finish()
}

fn window() -> TimeRange {
    TimeRange::last(Duration::minutes(30))
}

pub fn access_point_query(zone_id: &str) -> CoreResult<FluxQuery> {
    Ok(FluxQuery::new(AP_MEASUREMENT, window())
        .filter(Filter::equals("zoneId", zone_id)?)
        .group_by(&["apMac"])
        .last())
}

pub fn radio_query(zone_id: &str) -> CoreResult<FluxQuery> {
    Ok(FluxQuery::new(RADIO_MEASUREMENT, window())
        .filter(Filter::equals("zoneId", zone_id)?)
        .group_by(&["apMac", "band"])
        .last())
}

pub async fn fetch_access_points(
    store: &dyn TelemetryStore,
    zone_id: &str,
) -> CoreResult<AccessPointList> {
    let ap_query = access_point_query(zone_id)?;
    let radio_query = radio_query(zone_id)?;

    let ap_rows = store.query(&ap_query).await?;
    let radio_rows = store.query(&radio_query).await?;

    let list = aggregate_access_points(&ap_rows, &radio_rows)?;
    Ok(AccessPointList {
        total: list.len(),
        list,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn ap_row(mac: &str, field: &str, value: impl Into<Scalar>) -> Row {
        Row::new(AP_MEASUREMENT, field, Utc::now(), value)
            .with_tag("apMac", mac)
            .with_tag("apName", format!("AP-{mac}"))
            .with_tag("zoneId", "zone-001")
            .with_tag("zoneName", "Lobby")
            .with_tag("status", "online")
    }

    fn radio_row(mac: &str, band: &str, field: &str, value: i64) -> Row {
        Row::new(RADIO_MEASUREMENT, field, Utc::now(), value)
            .with_tag("apMac", mac)
            .with_tag("band", band)
            .with_tag("zoneId", "zone-001")
    }

    #[test]
    fn two_aps_with_two_radios_each() {
        let aps = vec![ap_row("aa", "clientCount", 5_i64), ap_row("bb", "clientCount", 9_i64)];
        let radios = vec![
            radio_row("aa", "5GHz", "channel", 36),
            radio_row("aa", "2.4GHz", "channel", 6),
            radio_row("bb", "5GHz", "channel", 149),
            radio_row("bb", "2.4GHz", "channel", 11),
            radio_row("aa", "5GHz", "txPower", 20),
        ];
        let out = aggregate_access_points(&aps, &radios).expect("aggregate");
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|ap| ap.radios.len() == 2));

        let aa = &out[0];
        assert_eq!(aa.mac, "aa");
        assert_eq!(aa.radios[0].band, "5GHz");
        assert_eq!(aa.radios[0].channel, 36);
        assert_eq!(aa.radios[0].tx_power, 20);
        assert_eq!(aa.radios[1].band, "2.4GHz");
        assert_eq!(out[1].radios[0].channel, 149);
    }

    #[test]
    fn defaults_for_unobserved_fields() {
        let out = aggregate_access_points(&[ap_row("aa", "cpuUtilization", 12.7)], &[])
            .expect("aggregate");
        let ap = &out[0];
        assert_eq!(ap.name, "AP-aa");
        assert_eq!(ap.cpu_utilization, 12);
        assert_eq!(ap.client_count, 0);
        assert_eq!(ap.model, "None");
        assert_eq!(ap.firmware_version, "None");
        assert!(ap.radios.is_empty());
    }

    #[test]
    fn radios_of_unknown_aps_are_dropped() {
        let out = aggregate_access_points(
            &[ap_row("aa", "clientCount", 1_i64)],
            &[radio_row("zz", "5GHz", "channel", 36)],
        )
        .expect("aggregate");
        assert_eq!(out.len(), 1);
        assert!(out[0].radios.is_empty());
    }

    #[test]
    fn aggregation_ignores_row_order() {
        let rows = vec![
            ap_row("aa", "clientCount", 3_i64),
            ap_row("aa", "firmwareVersion", "5.2.1"),
            ap_row("bb", "memoryUtilization", 40_i64),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let mut forward = aggregate_access_points(&rows, &[]).expect("forward");
        let mut backward = aggregate_access_points(&reversed, &[]).expect("backward");
        forward.sort_by(|a, b| a.mac.cmp(&b.mac));
        backward.sort_by(|a, b| a.mac.cmp(&b.mac));
        assert_eq!(forward, backward);
        assert_eq!(forward[0].firmware_version, "5.2.1");
    }

    #[test]
    fn non_numeric_metric_fails() {
        let err = aggregate_access_points(&[ap_row("aa", "clientCount", "lots")], &[])
            .expect_err("must fail");
        assert!(matches!(err, crate::CoreError::Coercion { .. }));
    }

    #[test]
    fn serializes_frontend_field_names() {
        let out = aggregate_access_points(
            &[ap_row("aa", "clientCount", 1_i64)],
            &[radio_row("aa", "5GHz", "noiseFloor", -92)],
        )
        .expect("aggregate");
        let v = serde_json::to_value(&out[0]).expect("serialize");
        assert_eq!(v["zoneName"], "Lobby");
        assert_eq!(v["radios"][0]["noiseFloor"], -92);
        assert!(v.get("channelUtilization").is_some());
    }

    #[test]
    fn queries_scope_to_zone() {
        let flux = radio_query("zone-001").expect("query").render("b");
        assert!(flux.contains("r[\"zoneId\"] == \"zone-001\""));
        assert!(flux.contains("group(columns: [\"apMac\", \"band\"])"));
        assert!(flux.contains("range(start: -30m)"));
    }
}
