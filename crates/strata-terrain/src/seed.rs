//! Deterministic seed derivation.
//!
//! One `u64` world seed drives everything: it is folded down to the `u32`
//! the noise functions take, and combined with a chunk key for per-chunk
//! random streams (structure picks, decorations).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strata_voxel::ChunkKey;

/// Fold a world seed into the `u32` seed used by the noise generators.
///
/// Uses SipHash (via std's `DefaultHasher`) so that nearby world seeds give
/// unrelated noise seeds.
pub fn noise_seed(world_seed: u64) -> u32 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}

/// Derive a u64 seed for a chunk from the world seed and chunk key.
pub fn derive_chunk_seed(world_seed: u64, key: ChunkKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a deterministic RNG for a specific chunk.
///
/// The returned RNG will produce an identical sequence of random numbers
/// for the same `(world_seed, key)` pair, regardless of thread or platform.
pub fn chunk_rng(world_seed: u64, key: ChunkKey) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_chunk_seed(world_seed, key))
}

/// Picks a fresh non-zero world seed. Zero is reserved for "pick one".
pub fn random_world_seed() -> u64 {
    loop {
        let seed: u64 = rand::random();
        if seed != 0 {
            return seed;
        }
    }
}
