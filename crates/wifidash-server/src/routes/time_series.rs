use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use wifidash_core::entities::time_series::{fetch_time_series, TimeSeriesRequest};

use crate::{
    error::{AppError, ValidatedQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesQuery {
    pub metric: String,
    /// Comma-separated zone ids.
    pub zone_ids: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Window width in minutes.
    pub interval: Option<u32>,
}

/// `GET /time-series`: windowed means of one metric, oldest first.
#[tracing::instrument(skip(state))]
pub async fn get_time_series(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<TimeSeriesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let req = TimeSeriesRequest {
        metric: query.metric,
        zone_ids: query
            .zone_ids
            .as_deref()
            .map(TimeSeriesRequest::split_zone_ids)
            .unwrap_or_default(),
        start: query.start_time,
        end: query.end_time,
        interval: query.interval.unwrap_or(1),
    };
    Ok(Json(fetch_time_series(state.store(), &req).await?))
}
