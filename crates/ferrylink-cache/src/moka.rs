use async_trait::async_trait;
use ferrylink_core::cache::Result;
use ferrylink_core::config::DEFAULT_CACHE_MAX_AGE;
use ferrylink_core::{CacheKey, CachedResponse, ResponseCache};
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// Default byte budget for cached bodies and headers (512 MiB).
pub const DEFAULT_CAPACITY_BYTES: u64 = 512 * 1024 * 1024;

/// Settings for [`MokaResponseCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct MokaCacheConfig {
    /// Total weight, in bytes, the cache may hold before evicting.
    #[builder(default = DEFAULT_CAPACITY_BYTES)]
    pub max_capacity_bytes: u64,
    /// Time-to-live for each entry.
    #[builder(default = DEFAULT_CACHE_MAX_AGE)]
    pub ttl: Duration,
}

impl Default for MokaCacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// An in-memory [`ResponseCache`] using Moka.
///
/// Entries are weighed by body plus header size so the capacity is a byte
/// budget rather than an entry count.
#[derive(Debug, Clone)]
pub struct MokaResponseCache {
    cache: Cache<String, CachedResponse>,
}

fn weigh(_key: &String, value: &CachedResponse) -> u32 {
    let headers: usize = value
        .headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum();
    u32::try_from(value.body.len() + headers).unwrap_or(u32::MAX)
}

impl MokaResponseCache {
    /// Creates a cache with [`DEFAULT_CAPACITY_BYTES`] and a one-year TTL.
    pub fn new() -> Self {
        Self::with_config(MokaCacheConfig::default())
    }

    pub fn with_config(config: MokaCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity_bytes)
            .weigher(weigh)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Number of entries, after pending maintenance has run.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for MokaResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for MokaResponseCache {
    async fn get_response(&self, key: &CacheKey) -> Result<Option<CachedResponse>> {
        trace!(key = %key, "Fetching response from Moka cache");

        match self.cache.get(key.as_str()).await {
            Some(response) => {
                debug!(key = %key, "Cache hit in Moka");
                Ok(Some(response))
            }
            None => {
                trace!(key = %key, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn put_response(&self, key: CacheKey, response: CachedResponse) -> Result<()> {
        trace!(key = %key, bytes = response.body.len(), "Storing response in Moka cache");

        self.cache.insert(key.to_string(), response).await;
        debug!(key = %key, "Cached response in Moka");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ferrylink_core::{AllowList, NormalizedUrl};
    use http::{HeaderMap, HeaderValue, StatusCode};

    fn key(path: &str) -> CacheKey {
        let url = NormalizedUrl::parse(&format!("github.com/{path}"), &AllowList::default())
            .unwrap();
        CacheKey::get(&url)
    }

    fn response(body: &'static [u8]) -> CachedResponse {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/zip"));
        CachedResponse::new(StatusCode::OK, headers, Bytes::from_static(body))
    }

    #[tokio::test]
    async fn miss_on_empty_cache() {
        let cache = MokaResponseCache::new();
        assert!(cache.get_response(&key("a.zip")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get() {
        let cache = MokaResponseCache::new();
        cache
            .put_response(key("a.zip"), response(b"payload"))
            .await
            .unwrap();

        let hit = cache.get_response(&key("a.zip")).await.unwrap().unwrap();
        assert_eq!(hit.status, StatusCode::OK);
        assert_eq!(hit.body, Bytes::from_static(b"payload"));
        assert_eq!(hit.headers["content-type"], "application/zip");
        assert_eq!(cache.entry_count().await, 1);
    }

    #[tokio::test]
    async fn keys_are_per_target() {
        let cache = MokaResponseCache::new();
        cache
            .put_response(key("a.zip"), response(b"a"))
            .await
            .unwrap();

        assert!(cache.get_response(&key("b.zip")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_not_served() {
        let cache = MokaResponseCache::with_config(
            MokaCacheConfig::builder()
                .ttl(Duration::from_millis(50))
                .build(),
        );
        cache
            .put_response(key("a.zip"), response(b"a"))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get_response(&key("a.zip")).await.unwrap().is_none());
    }

    #[test]
    fn weight_counts_body_and_headers() {
        let entry = response(b"12345");
        let expected = 5 + "content-type".len() + "application/zip".len();
        assert_eq!(weigh(&String::new(), &entry) as usize, expected);
    }
}
