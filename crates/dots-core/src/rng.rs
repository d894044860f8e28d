use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Derive a stream for a population restored at `generation`.
///
/// Checkpoints do not carry RNG state, so a resumed run reseeds from the
/// configured seed and the generation it resumes at.
pub fn derive_generation_rng(base_seed: u64, generation: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(
        base_seed.wrapping_add(generation.wrapping_mul(crate::constants::RNG_DERIVATION_PRIME)),
    )
}
