use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::info;

use crate::error::Result;
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;

pub async fn shorten_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>> {
    let Json(request) = payload?;
    let link = state.shortener().shorten(&request.url).await?;
    info!(code = %link.code, target = %link.target, "short link issued");

    let base = state.short_url_base(&headers);
    Ok(Json(ShortenResponse {
        short: link.code.to_url(&base),
        long: link.target.to_string(),
        code: link.code.to_string(),
    }))
}
