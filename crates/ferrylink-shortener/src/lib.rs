//! Short-link registry.
//!
//! This crate issues collision-checked short codes for normalized target
//! URLs, deduplicated by a content hash, and resolves codes back to their
//! targets. Persistence goes through the [`KvStore`](ferrylink_core::KvStore)
//! collaborator.

pub mod error;
pub mod generator;
pub mod registry;
pub mod shortener;

pub use error::ShortenerError;
pub use generator::{Generator, RandomGenerator};
pub use registry::ShortLinkRegistry;
pub use shortener::{ShortLink, Shortener};
