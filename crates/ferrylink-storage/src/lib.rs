//! Key-value store backends for the short-link registry.

pub mod memory;
pub mod redis;

pub use ferrylink_core::{KvStore, StorageError};
pub use memory::InMemoryKvStore;
pub use self::redis::RedisKvStore;
