//! Seeded random number generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates a reproducible RNG from a seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates an RNG from an optional seed, drawing a random one when absent.
pub fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => create_rng(s),
        None => create_rng(rand::random()),
    }
}

/// Draws a vector of `n` random keys in `[0, 1)`.
pub fn random_keys<R: Rng>(n: usize, rng: &mut R) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(0.0..1.0)).collect()
}
