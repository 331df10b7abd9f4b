use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use wifidash_core::config::Config;
use wifidash_core::query::FluxQuery;
use wifidash_core::{Row, TelemetryStore};

use crate::annotated;
use crate::normalize::normalize;

/// HTTP client for the InfluxDB 2.x query API.
///
/// Flux text is rendered from a [`FluxQuery`] and posted as JSON together
/// with a dialect that asks for fully annotated CSV, so every column comes
/// back with its datatype.
#[derive(Clone)]
pub struct InfluxClient {
    client: Client,
    url: String,
    token: Option<String>,
    org: String,
    bucket: String,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

impl InfluxClient {
    pub fn new(url: &str, token: Option<&str>, org: &str, bucket: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
            org: org.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.influx_url,
            config.influx_token.as_deref(),
            &config.influx_org,
            &config.influx_bucket,
        )
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{path}", self.url)).context("Invalid InfluxDB URL")
    }

    fn query_url(&self) -> Result<Url> {
        let mut url = self.endpoint("/api/v2/query")?;
        url.query_pairs_mut().append_pair("org", &self.org);
        Ok(url)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Token {token}")),
            None => req,
        }
    }

    /// Post Flux text and return the raw annotated-CSV body.
    pub async fn query_csv(&self, flux: &str) -> Result<String> {
        let body = json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "delimiter": ",",
                "annotations": ["datatype", "group", "default"],
            },
        });

        let resp = self
            .authorized(self.client.post(self.query_url()?))
            .header("Accept", "application/csv")
            .json(&body)
            .send()
            .await
            .context("InfluxDB HTTP request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB error {status}: {body}");
        }

        resp.text().await.context("InfluxDB response read failed")
    }
}

#[async_trait::async_trait]
impl TelemetryStore for InfluxClient {
    async fn query(&self, query: &FluxQuery) -> Result<Vec<Row>> {
        let flux = query.render(&self.bucket);
        debug!(measurement = %query.measurement, flux = %flux, "running flux query");

        let csv = self.query_csv(&flux).await?;
        let records = annotated::decode(&csv)
            .with_context(|| format!("decoding {} result", query.measurement))?;
        let rows = normalize(&records)
            .with_context(|| format!("normalizing {} result", query.measurement))?;

        debug!(measurement = %query.measurement, rows = rows.len(), "flux query complete");
        Ok(rows)
    }

    async fn health(&self) -> bool {
        let url = match self.endpoint("/health") {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "InfluxDB health check skipped");
                return false;
            }
        };
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "InfluxDB health check failed");
                return false;
            }
        };
        match resp.json::<HealthBody>().await {
            Ok(body) => body.status == "pass",
            Err(e) => {
                warn!(error = %e, "InfluxDB health response unreadable");
                false
            }
        }
    }
}
