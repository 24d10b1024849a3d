use crate::error::CacheError;
use crate::url::NormalizedUrl;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use jiff::Timestamp;
use std::fmt::Display;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Identifies a cache entry: always a `GET` of a normalized target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn get(target: &NormalizedUrl) -> Self {
        Self(format!("GET {}", target.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete upstream response as it was delivered to the first client.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub stored_at: Timestamp,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: Timestamp::now(),
        }
    }

    /// Whole seconds since the entry was stored, never negative.
    pub fn age_secs(&self) -> u64 {
        let elapsed = Timestamp::now().as_second() - self.stored_at.as_second();
        u64::try_from(elapsed).unwrap_or(0)
    }
}

/// An edge response cache with get/put semantics and no invalidation API.
#[async_trait]
pub trait ResponseCache: Send + Sync + 'static {
    /// Returns `Ok(None)` on a miss.
    async fn get_response(&self, key: &CacheKey) -> Result<Option<CachedResponse>>;

    /// Stores a response. Entries are never explicitly invalidated.
    async fn put_response(&self, key: CacheKey, response: CachedResponse) -> Result<()>;
}
