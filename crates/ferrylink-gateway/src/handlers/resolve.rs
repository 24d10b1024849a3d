use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Serves the target of a short link through the proxy engine.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response> {
    let target = state
        .shortener()
        .resolve(&code)
        .await?
        .ok_or(AppError::NotFound)?;
    debug!(code = %code, target = %target, "short link resolved");

    Ok(state.engine().serve(&method, &headers, &target).await)
}
