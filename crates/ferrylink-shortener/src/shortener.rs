use crate::error::Result;
use async_trait::async_trait;
use ferrylink_core::{NormalizedUrl, ShortCode};
use serde::Serialize;

/// A short code together with the normalized target it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortLink {
    pub code: ShortCode,
    pub target: NormalizedUrl,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Issues a short code for `url`, or returns the one already issued.
    async fn shorten(&self, url: &str) -> Result<ShortLink>;

    /// Resolves a short code to its target.
    /// Returns `None` if the code is unknown or not a well-formed code.
    async fn resolve(&self, code: &str) -> Result<Option<NormalizedUrl>>;
}
