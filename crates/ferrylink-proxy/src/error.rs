use ferrylink_core::NormalizeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    #[error("{0}")]
    InvalidUrl(#[from] NormalizeError),
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),
}
