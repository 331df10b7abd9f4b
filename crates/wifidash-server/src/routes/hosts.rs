use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use wifidash_core::entities::host_usage::{fetch_hosts, HostSort, DEFAULT_LIMIT};

use crate::{
    error::{AppError, ValidatedQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct HostsQuery {
    pub limit: Option<usize>,
    pub sort: Option<HostSort>,
}

/// `GET /hosts`: top hosts by data usage.
#[tracing::instrument(skip(state))]
pub async fn get_hosts(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<HostsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let hosts = fetch_hosts(
        state.store(),
        query.sort.unwrap_or_default(),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    )
    .await?;
    Ok(Json(hosts))
}
