use async_trait::async_trait;
use dashmap::DashMap;
use ferrylink_core::kv::{KvStore, Result};

/// In-memory implementation of [`KvStore`] using DashMap.
///
/// Suitable for single-node deployments and tests. Contents are lost on
/// restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKvStore {
    storage: DashMap<String, String>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.storage.get(key).map(|value| value.clone()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.storage.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
