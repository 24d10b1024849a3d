use crate::generator::Generator;
use ferrylink_core::shortcode::{ALPHABET, CODE_LENGTH};
use ferrylink_core::ShortCode;
use rand::Rng;

/// Draws each character independently and uniformly from the base58 alphabet.
///
/// With 58^6 (about 3.8e10) possible codes, collisions are rare but not
/// impossible; the registry's bounded retry handles them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        let mut rng = rand::thread_rng();
        let mut indices = [0usize; CODE_LENGTH];
        for index in indices.iter_mut() {
            *index = rng.gen_range(0..ALPHABET.len());
        }
        ShortCode::from_indices(indices)
    }
}
