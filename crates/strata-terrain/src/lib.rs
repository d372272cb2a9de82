//! Procedural terrain: the seeded density field, chunk terrain generation,
//! floating islands, and simple structure builders.

pub mod density;
pub mod generation;
pub mod island;
pub mod prefab;
pub mod seed;

pub use density::{DensityField, DensityParams};
pub use generation::{DIRT_DEPTH, GRASS_DEPTH, build_chunk_terrain, generate_chunk, surface_material};
pub use island::{Island, island_density};
pub use prefab::{Pattern, RoomParams, apply_pattern, pick_weighted, rectangular_prism, room, spawn_platform};
pub use seed::{chunk_rng, derive_chunk_seed, noise_seed, random_world_seed};
