use async_trait::async_trait;
use ferrylink_core::kv::{KvStore, Result};
use ferrylink_core::StorageError;
use ::redis::AsyncCommands;
use tracing::{debug, trace, warn};

pub const DEFAULT_KEY_PREFIX: &str = "ferrylink:";

/// A Redis-backed [`KvStore`].
///
/// Every key is stored under a configurable namespace so the relay can share
/// a Redis instance with other services. Writes use plain `SET`; there is no
/// `SETNX`, matching the store contract that offers no compare-and-swap.
#[derive(Debug, Clone)]
pub struct RedisKvStore {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("timed out") {
        StorageError::Timeout(message)
    } else if lowered.contains("connection refused") || lowered.contains("broken pipe") {
        StorageError::Unavailable(message)
    } else {
        StorageError::Operation(message)
    }
}

impl RedisKvStore {
    /// Creates a store using [`DEFAULT_KEY_PREFIX`].
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a store with a custom key namespace (e.g. `"dl:"`).
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("invalid Redis url", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }

    fn namespaced(&self, key: &str) -> String {
        prefixed(&self.key_prefix, key)
    }
}

fn prefixed(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = self.namespaced(key);
        trace!(key = %key, "reading from Redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(value) => {
                debug!(key = %key, found = value.is_some(), "Redis read");
                Ok(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to read value from Redis", e))
            }
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let key = self.namespaced(key);
        trace!(key = %key, "writing to Redis");

        let mut conn = self.conn.clone();
        match conn.set::<_, _, ()>(&key, value).await {
            Ok(()) => {
                debug!(key = %key, "Redis write");
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis error on set");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(prefixed(DEFAULT_KEY_PREFIX, "c:abc123"), "ferrylink:c:abc123");
        assert_eq!(prefixed("dl:", "u:deadbeef"), "dl:u:deadbeef");
        assert_eq!(prefixed("", "c:abc123"), "c:abc123");
    }

    #[test]
    fn timeouts_are_classified() {
        let err = redis::RedisError::from(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        let mapped = map_redis_error("failed to read value from Redis", err);
        assert!(matches!(mapped, StorageError::Timeout(_)), "{mapped:?}");
    }

    #[test]
    fn refused_connections_are_unavailable() {
        let err = redis::RedisError::from(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let mapped = map_redis_error("failed to connect to Redis", err);
        match mapped {
            StorageError::Unavailable(message) => {
                assert!(message.starts_with("failed to connect to Redis: "))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_failures_are_operation_errors() {
        let err = redis::RedisError::from(io::Error::new(io::ErrorKind::Other, "wrong type"));
        let mapped = map_redis_error("failed to write value to Redis", err);
        assert!(matches!(mapped, StorageError::Operation(_)), "{mapped:?}");
    }
}
