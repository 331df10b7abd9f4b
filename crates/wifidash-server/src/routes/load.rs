use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use wifidash_core::entities::load::fetch_load;

use crate::{
    error::{AppError, ValidatedQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadQuery {
    pub hours: Option<u32>,
    pub zone_id: Option<String>,
}

/// `GET /load`: per-band load over the last `hours` (1 to 24, default 1).
#[tracing::instrument(skip(state))]
pub async fn get_load(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<LoadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let load = fetch_load(
        state.store(),
        query.hours.unwrap_or(1),
        query.zone_id.as_deref(),
    )
    .await?;
    Ok(Json(load))
}
