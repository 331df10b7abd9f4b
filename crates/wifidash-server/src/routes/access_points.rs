use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use wifidash_core::entities::access_point::fetch_access_points;

use crate::{error::AppError, state::AppState};

/// `GET /zones/{zone_id}/aps`
#[tracing::instrument(skip(state))]
pub async fn get_access_points(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_access_points(state.store(), &zone_id).await?))
}
