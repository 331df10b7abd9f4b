use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use wifidash_core::entities::os_distribution::fetch_os_distribution;

use crate::{error::AppError, state::AppState};

/// `GET /os-distribution`
#[tracing::instrument(skip(state))]
pub async fn get_os_distribution(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_os_distribution(state.store()).await?))
}
