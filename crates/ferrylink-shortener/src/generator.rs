pub mod random;

pub use random::RandomGenerator;

use ferrylink_core::ShortCode;

/// Trait for generating candidate short codes.
///
/// Implementations are pure generators that don't interact with storage;
/// collision checks happen in the registry.
pub trait Generator: Send + Sync + 'static {
    fn generate(&self) -> ShortCode;
}
