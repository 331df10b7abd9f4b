use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use wifidash_core::entities::venue::fetch_venue;

use crate::{error::AppError, state::AppState};

/// `GET /venue`: venue totals with every zone, zones ordered by id.
#[tracing::instrument(skip(state))]
pub async fn get_venue(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let venue = fetch_venue(state.store(), &state.config.venue_name).await?;
    Ok(Json(venue))
}
