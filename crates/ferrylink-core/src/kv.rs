use crate::error::StorageError;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, StorageError>;

/// A durable, eventually consistent string-to-string store.
///
/// Keys carry their own namespace prefix (`c:`, `u:`). There is no
/// compare-and-swap: callers coordinate by reading before writing and must
/// tolerate the race that leaves open.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Returns `Ok(None)` if the key has never been written (or was evicted).
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}
