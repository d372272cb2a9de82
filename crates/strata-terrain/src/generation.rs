//! Chunk terrain generation: density → solidity, depth → material.
//!
//! Each column is walked top-down so the distance below the surface is known
//! when a voxel is placed. The top voxel of a column looks into the chunk
//! above to continue that count across the chunk boundary.

use glam::I64Vec3;
use strata_voxel::coords::world_position;
use strata_voxel::{CHUNK_SIZE, Chunk, ChunkKey, ChunkStore, Material, VoxelEdit};

use crate::density::DensityField;

/// Depth at which dirt turns into stone.
pub const DIRT_DEPTH: u32 = 4;

/// Depth at which grass turns into dirt.
pub const GRASS_DEPTH: u32 = 1;

/// Material for a solid voxel `depth` voxels below the surface.
pub fn surface_material(depth: u32) -> Material {
    if depth >= DIRT_DEPTH {
        Material::Stone
    } else if depth >= GRASS_DEPTH {
        Material::Dirt
    } else {
        Material::Grass
    }
}

fn sample(field: &DensityField, key: ChunkKey, local: [usize; 3]) -> bool {
    field.is_solid(world_position(key, local).as_dvec3())
}

/// Writes the terrain of chunk `key` into `store`.
///
/// `store` is a scratch store holding the target chunk at `(0, 0, 0)`; voxels
/// are addressed by their local position so the chunk's `modified` flag ends
/// up set iff any voxel became solid.
pub fn build_chunk_terrain<M>(store: &mut ChunkStore<M>, key: ChunkKey, field: &DensityField) {
    let above = key.offset(0, 0, 1);
    let top = CHUNK_SIZE - 1;

    for x in 0..CHUNK_SIZE {
        for y in 0..CHUNK_SIZE {
            let mut depth = 0;
            for z in (0..CHUNK_SIZE).rev() {
                if !sample(field, key, [x, y, z]) {
                    depth = 0;
                    continue;
                }
                if z == top {
                    for za in 0..DIRT_DEPTH as usize {
                        if !sample(field, above, [x, y, za]) {
                            break;
                        }
                        depth = za as u32 + 1;
                    }
                }
                let local = I64Vec3::new(x as i64, y as i64, z as i64);
                store.edit_voxel(local, &VoxelEdit::solid(surface_material(depth)));
                depth += 1;
            }
        }
    }
}

/// Generates chunk `key` from scratch.
pub fn generate_chunk(key: ChunkKey, field: &DensityField) -> Chunk {
    let scratch_key = ChunkKey::new(0, 0, 0);
    let mut scratch: ChunkStore = ChunkStore::new();
    scratch.insert_chunk(scratch_key, Chunk::new());
    build_chunk_terrain(&mut scratch, key, field);
    scratch.take_chunk(scratch_key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::DensityParams;
    use strata_voxel::VoxelMode;
    use strata_voxel::coords::local_to_index;

    fn field() -> DensityField {
        DensityField::new(12345, DensityParams::default())
    }

    #[test]
    fn test_surface_material_bands() {
        assert_eq!(surface_material(0), Material::Grass);
        assert_eq!(surface_material(1), Material::Dirt);
        assert_eq!(surface_material(3), Material::Dirt);
        assert_eq!(surface_material(4), Material::Stone);
        assert_eq!(surface_material(40), Material::Stone);
    }

    #[test]
    fn test_sky_chunk_is_air_and_clean() {
        let chunk = generate_chunk(ChunkKey::new(0, 0, 20), &field());
        assert_eq!(chunk.mode(), VoxelMode::Air);
        assert!(!chunk.is_modified());
    }

    #[test]
    fn test_deep_chunk_is_stone() {
        let chunk = generate_chunk(ChunkKey::new(0, 0, -20), &field());
        assert!(chunk.is_modified());
        for index in [0, 1000, 32767] {
            let voxel = chunk.get(index);
            assert!(voxel.is_solid());
            assert_eq!(voxel.material(), Material::Stone);
        }
    }

    #[test]
    fn test_columns_follow_grass_dirt_stone() {
        let field = field();
        let key = ChunkKey::new(0, 0, 0);
        let chunk = generate_chunk(key, &field);
        for (x, y) in [(0, 0), (7, 19), (31, 31)] {
            let mut depth = None;
            for z in (0..CHUNK_SIZE).rev() {
                let voxel = chunk.get(local_to_index([x, y, z]));
                let expected_solid = field.is_solid(world_position(key, [x, y, z]).as_dvec3());
                assert_eq!(voxel.is_solid(), expected_solid);
                if !voxel.is_solid() {
                    depth = Some(0);
                    continue;
                }
                // Below an air gap inside the chunk, the band sequence restarts.
                if let Some(d) = depth {
                    assert_eq!(voxel.material(), surface_material(d));
                    depth = Some(d + 1);
                }
            }
        }
    }

    #[test]
    fn test_generation_deterministic() {
        let key = ChunkKey::new(2, -3, 0);
        assert_eq!(generate_chunk(key, &field()), generate_chunk(key, &field()));
    }
}
