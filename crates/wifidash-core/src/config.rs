#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Mount point of the JSON API, e.g. `/api`. Empty mounts at the root.
    pub api_prefix: String,
    pub venue_name: String,
    pub influx_url: String,
    pub influx_token: Option<String>,
    pub influx_org: String,
    pub influx_bucket: String,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            api_prefix: "/api".to_string(),
            venue_name: "GA29532-P - Signal House".to_string(),
            influx_url: "http://localhost:8086".to_string(),
            influx_token: None,
            influx_org: "wifi-org".to_string(),
            influx_bucket: "wifi-streaming".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            port: match lookup("WIFIDASH_PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| format!("invalid port {raw:?}: {e}"))?,
                None => defaults.port,
            },
            api_prefix: lookup("WIFIDASH_API_PREFIX")
                .map(|p| normalize_prefix(&p))
                .unwrap_or(defaults.api_prefix),
            venue_name: lookup("WIFIDASH_VENUE_NAME").unwrap_or(defaults.venue_name),
            influx_url: lookup("INFLUXDB_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.influx_url),
            influx_token: lookup("INFLUXDB_TOKEN").filter(|t| !t.is_empty()),
            influx_org: lookup("INFLUXDB_ORG").unwrap_or(defaults.influx_org),
            influx_bucket: lookup("INFLUXDB_BUCKET").unwrap_or(defaults.influx_bucket),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        })
    }
}

/// `api/` and `/api/` both become `/api`; `/` becomes empty.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
