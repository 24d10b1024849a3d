use axum::extract::{Query, State};
use axum::Json;

use crate::error::{AppError, Result};
use crate::model::{MetaQuery, MetaResponse};
use crate::state::AppState;

pub async fn meta_handler(
    State(state): State<AppState>,
    Query(query): Query<MetaQuery>,
) -> Result<Json<MetaResponse>> {
    let url = query.url.unwrap_or_default();
    let probe = state
        .resolver()
        .probe(&url)
        .await
        .map_err(AppError::Metadata)?;
    Ok(Json(probe.into()))
}
