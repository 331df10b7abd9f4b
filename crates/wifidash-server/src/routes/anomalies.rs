use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use wifidash_core::entities::anomaly::{
    fetch_anomalies, AnomalyFilter, AnomalySort, Severity, DEFAULT_LIMIT,
};

use crate::{
    error::{AppError, ValidatedQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomaliesQuery {
    pub severity: Option<Severity>,
    pub zone_id: Option<String>,
    pub limit: Option<usize>,
    pub sort: Option<AnomalySort>,
}

/// `GET /anomalies`
#[tracing::instrument(skip(state))]
pub async fn get_anomalies(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<AnomaliesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = AnomalyFilter {
        severity: query.severity,
        zone_id: query.zone_id,
    };
    let anomalies = fetch_anomalies(
        state.store(),
        &filter,
        query.sort.unwrap_or_default(),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    )
    .await?;
    Ok(Json(anomalies))
}
