use ferrylink_core::{NormalizeError, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("{0}")]
    InvalidUrl(#[from] NormalizeError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
