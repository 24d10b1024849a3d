//! Core types and traits for the ferrylink download relay.
//!
//! This crate provides the configuration value, the URL normalizer and the
//! collaborator traits (key-value store, response cache) shared by the
//! shortener, the proxy engine and the gateway.

pub mod cache;
pub mod config;
pub mod error;
pub mod kv;
pub mod shortcode;
pub mod url;

pub use cache::{CacheKey, CachedResponse, ResponseCache};
pub use config::{AllowList, RelayConfig};
pub use error::{CacheError, CoreError, NormalizeError, StorageError};
pub use kv::KvStore;
pub use shortcode::ShortCode;
pub use url::NormalizedUrl;
