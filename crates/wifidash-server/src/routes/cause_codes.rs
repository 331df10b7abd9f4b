use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use wifidash_core::entities::cause_code::{fetch_cause_codes, CauseCodeSort};

use crate::{
    error::{AppError, ValidatedQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CauseCodesQuery {
    pub limit: Option<usize>,
    pub sort: Option<CauseCodeSort>,
}

/// `GET /cause-codes`
#[tracing::instrument(skip(state))]
pub async fn get_cause_codes(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<CauseCodesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let codes =
        fetch_cause_codes(state.store(), query.sort.unwrap_or_default(), query.limit).await?;
    Ok(Json(codes))
}
