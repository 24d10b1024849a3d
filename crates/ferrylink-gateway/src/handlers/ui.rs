use axum::response::Html;

use crate::error::{AppError, Result};

pub const INDEX_PAGE: &str = include_str!("../../assets/index.html");
pub const NOT_FOUND_PAGE: &str = include_str!("../../assets/not_found.html");

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Any non-`GET` request to `/` names no target.
pub async fn missing_target_handler() -> Result<()> {
    Err(AppError::MissingTarget)
}
