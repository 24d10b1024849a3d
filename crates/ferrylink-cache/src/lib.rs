//! Edge response cache implementations.

pub mod moka;

pub use self::moka::{MokaCacheConfig, MokaResponseCache};
pub use ferrylink_core::{CacheKey, CachedResponse, ResponseCache};
