use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use wifidash_core::entities::client::{fetch_clients, ClientFilter, ClientSort, DEFAULT_LIMIT};

use crate::{
    error::{AppError, ValidatedQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientsQuery {
    pub zone_id: Option<String>,
    /// MAC address of the access point.
    pub ap_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<ClientSort>,
}

/// `GET /clients`: paginated client list.
#[tracing::instrument(skip(state))]
pub async fn get_clients(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ClientsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ClientFilter {
        zone_id: query.zone_id,
        ap_mac: query.ap_id,
    };
    let page = fetch_clients(
        state.store(),
        &filter,
        query.sort.unwrap_or_default(),
        query.limit.unwrap_or(DEFAULT_LIMIT),
        query.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(page))
}
