//! Connected clients, filtered by zone and access point.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, float_field, text_field, EntityBuilder};
use crate::assemble::{paginate, Pagination};
use crate::error::CoreResult;
use crate::query::{FluxQuery, TimeRange};
use crate::row::{Row, Scalar};
use crate::store::TelemetryStore;

pub const MEASUREMENT: &str = "client_metrics";

pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub hostname: String,
    pub model_name: String,
    pub ip_address: String,
    pub mac_address: String,
    pub wlan: String,
    pub ap_name: String,
    pub ap_mac: String,
    pub data_usage: f64,
    pub os: String,
    pub device_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientPage {
    pub data: Vec<Client>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientSort {
    #[default]
    DataUsage,
    Hostname,
    /// Store order.
    Timestamp,
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub zone_id: Option<String>,
    pub ap_mac: Option<String>,
}

pub struct ClientBuilder {
    mac_address: String,
    hostname: Option<Scalar>,
    model_name: Option<Scalar>,
    ip_address: Option<Scalar>,
    wlan: Option<Scalar>,
    ap_name: Option<Scalar>,
    ap_mac: Option<Scalar>,
    data_usage: Option<Scalar>,
    os: Option<Scalar>,
    device_type: Option<Scalar>,
}

impl EntityBuilder for ClientBuilder {
    type Key = String;
    type Output = Client;
    const MEASUREMENT: &'static str = MEASUREMENT;

    fn key(row: &Row) -> CoreResult<Option<String>> {
        Ok(row.tag("macAddress").map(str::to_string))
    }

    fn seed(key: &String, row: &Row) -> Self {
        Self {
            mac_address: key.clone(),
            hostname: None,
            model_name: None,
            ip_address: None,
            wlan: row.tag_scalar("wlan"),
            ap_name: row.tag_scalar("apName"),
            ap_mac: row.tag_scalar("apMac"),
            data_usage: None,
            os: row.tag_scalar("os"),
            device_type: row.tag_scalar("deviceType"),
        }
    }

    fn apply(&mut self, row: &Row) {
        let slot = match row.field.as_str() {
            "hostname" => &mut self.hostname,
            "modelName" => &mut self.model_name,
            "ipAddress" => &mut self.ip_address,
            "wlan" => &mut self.wlan,
            "apName" => &mut self.ap_name,
            "apMac" => &mut self.ap_mac,
            "dataUsage" => &mut self.data_usage,
            "os" => &mut self.os,
            "deviceType" => &mut self.device_type,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<Client> {
        Ok(Client {
            hostname: text_field(self.hostname.as_ref(), ""),
            model_name: text_field(self.model_name.as_ref(), "Unknown"),
            ip_address: text_field(self.ip_address.as_ref(), ""),
            mac_address: self.mac_address,
            wlan: text_field(self.wlan.as_ref(), ""),
            ap_name: text_field(self.ap_name.as_ref(), ""),
            ap_mac: text_field(self.ap_mac.as_ref(), ""),
            data_usage: float_field(self.data_usage.as_ref(), "dataUsage")?,
            os: text_field(self.os.as_ref(), "Unknown"),
            device_type: text_field(self.device_type.as_ref(), "other"),
        })
    }
}

pub fn client_query(filter: &ClientFilter) -> CoreResult<FluxQuery> {
    Ok(
        FluxQuery::new(MEASUREMENT, TimeRange::last(Duration::hours(2)))
            .filter_eq("zoneId", filter.zone_id.as_deref())
            .map_err(|e| e.for_param("zoneId"))?
            .filter_eq("apMac", filter.ap_mac.as_deref())
            .map_err(|e| e.for_param("apId"))?
            .group_by(&["macAddress"])
            .last(),
    )
}

/// Stable sort in place.
pub fn sort_clients(clients: &mut [Client], sort: ClientSort) {
    match sort {
        ClientSort::DataUsage => {
            clients.sort_by(|a, b| b.data_usage.total_cmp(&a.data_usage));
        }
        ClientSort::Hostname => {
            clients.sort_by_cached_key(|c| c.hostname.to_lowercase());
        }
        ClientSort::Timestamp => {}
    }
}

/// Latest state of every client in the window, unsorted.
pub async fn fetch_all_clients(
    store: &dyn TelemetryStore,
    filter: &ClientFilter,
) -> CoreResult<Vec<Client>> {
    let rows = store.query(&client_query(filter)?).await?;
    aggregate::<ClientBuilder>(&rows)
}

pub async fn fetch_clients(
    store: &dyn TelemetryStore,
    filter: &ClientFilter,
    sort: ClientSort,
    limit: usize,
    offset: usize,
) -> CoreResult<ClientPage> {
    let mut clients = fetch_all_clients(store, filter).await?;
    sort_clients(&mut clients, sort);
    let (data, pagination) = paginate(clients, limit, offset);
    Ok(ClientPage { data, pagination })
}
