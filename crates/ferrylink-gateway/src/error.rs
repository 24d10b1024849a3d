use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use ferrylink_core::{NormalizeError, StorageError};
use ferrylink_proxy::ProbeError;
use ferrylink_shortener::ShortenerError;
use thiserror::Error;
use tracing::error;

use crate::handlers::ui::NOT_FOUND_PAGE;
use crate::model::ErrorBody;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidUrl(#[from] NormalizeError),
    #[error("Invalid request body")]
    InvalidBody(#[source] JsonRejection),
    #[error("Missing target URL")]
    MissingTarget,
    #[error("Failed to fetch metadata")]
    Metadata(#[source] ProbeError),
    #[error("short link not found")]
    NotFound,
    #[error("storage operation failed: {0}")]
    Storage(#[from] StorageError),
}

impl From<ShortenerError> for AppError {
    fn from(error: ShortenerError) -> Self {
        match error {
            ShortenerError::InvalidUrl(source) => AppError::InvalidUrl(source),
            ShortenerError::Storage(source) => AppError::Storage(source),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response(),
            AppError::Metadata(source) => {
                let body = ErrorBody::new(self.to_string()).with_details(source.to_string());
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::InvalidBody(rejection) => {
                let body = ErrorBody::new(self.to_string()).with_details(rejection.body_text());
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::Storage(source) => {
                error!(error = %source, "storage failure");
                let body = ErrorBody::new("Internal storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::InvalidUrl(_) | AppError::MissingTarget => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(self.to_string()))).into_response()
            }
        }
    }
}
