//! Terrain breakage around an explosion.

use glam::{DVec3, I64Vec3};
use rand::Rng;
use strata_voxel::ChunkStore;
use strata_voxel::coords::snap_to_voxel;

/// Exponent shaping the break chance falloff.
const FALLOFF_BEND: f64 = 0.7;

/// Break chance at the centre before clamping by the roll.
const CHANCE_SCALE: f64 = 1.5;

/// Chance that a voxel `distance` from the centre breaks.
///
/// Above `1.0` near the centre, so the core always breaks; zero from
/// `radius` outwards.
pub fn break_chance(distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 {
        return 0.0;
    }
    let t = ((radius - distance) / radius).clamp(0.0, 1.0);
    t.powf(FALLOFF_BEND) * CHANCE_SCALE
}

/// Clears solidity in a cube of half-size `radius` around `centre`, each
/// voxel with probability [`break_chance`].
///
/// Returns the number of voxels that were solid and got cleared.
pub fn carve_explosion<M, R: Rng + ?Sized>(
    store: &mut ChunkStore<M>,
    centre: DVec3,
    radius: i64,
    rng: &mut R,
) -> usize {
    let origin = snap_to_voxel(centre);
    let r = radius.max(0);
    let mut cleared = 0;

    for x in -r..=r {
        for y in -r..=r {
            for z in -r..=r {
                let offset = I64Vec3::new(x, y, z);
                let chance = break_chance(offset.as_dvec3().length(), r as f64);
                if chance <= rng.random::<f64>() {
                    continue;
                }
                let position = origin + offset;
                if store.is_solid(position) {
                    store.set_solid(position, false);
                    cleared += 1;
                }
            }
        }
    }

    tracing::debug!(?origin, radius = r, cleared, "explosion carved terrain");
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use strata_voxel::{Chunk, ChunkKey, Material, VoxelEdit};

    fn solid_store() -> ChunkStore {
        let mut store = ChunkStore::new();
        for x in -1..=0 {
            for y in -1..=0 {
                for z in -1..=0 {
                    let key = ChunkKey::new(x, y, z);
                    store.insert_chunk(key, Chunk::new());
                    let origin = key.origin();
                    for lx in 0..32 {
                        for ly in 0..32 {
                            for lz in 0..32 {
                                store.edit_voxel(
                                    origin + I64Vec3::new(lx, ly, lz),
                                    &VoxelEdit::solid(Material::Stone),
                                );
                            }
                        }
                    }
                }
            }
        }
        store
    }

    #[test]
    fn test_break_chance_falloff() {
        assert!(break_chance(0.0, 3.0) > 1.0);
        assert_eq!(break_chance(3.0, 3.0), 0.0);
        assert_eq!(break_chance(5.0, 3.0), 0.0);
        assert!(break_chance(1.0, 3.0) > break_chance(2.0, 3.0));
        assert_eq!(break_chance(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_centre_always_breaks() {
        let mut store = solid_store();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let cleared = carve_explosion(&mut store, DVec3::new(0.2, -0.3, 0.1), 3, &mut rng);
        assert!(cleared > 0);
        assert!(!store.is_solid(I64Vec3::ZERO));
        // Every voxel within chance >= 1 is gone.
        for p in [I64Vec3::X, I64Vec3::NEG_Y, I64Vec3::Z] {
            assert!(!store.is_solid(p));
        }
    }

    #[test]
    fn test_outside_radius_survives() {
        let mut store = solid_store();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        carve_explosion(&mut store, DVec3::ZERO, 3, &mut rng);
        // Corners of the cube are further than the radius.
        assert!(store.is_solid(I64Vec3::new(3, 3, 3)));
        assert!(store.is_solid(I64Vec3::new(3, 0, 0)));
        assert!(store.is_solid(I64Vec3::new(4, 0, 0)));
    }

    #[test]
    fn test_deterministic_with_seeded_rng() {
        let mut a = solid_store();
        let mut b = solid_store();
        let ca = carve_explosion(&mut a, DVec3::ZERO, 4, &mut ChaCha8Rng::seed_from_u64(1));
        let cb = carve_explosion(&mut b, DVec3::ZERO, 4, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(ca, cb);
        assert_eq!(a.chunk(ChunkKey::new(0, 0, 0)), b.chunk(ChunkKey::new(0, 0, 0)));
    }
}
