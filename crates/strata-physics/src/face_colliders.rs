//! Triangle colliders built from the voxels around a body.
//!
//! Every solid voxel in a small box contributes all six of its faces as two
//! triangles each. Hidden faces are kept; movement code resolves against the
//! triangle set and the duplicates are harmless.

use glam::{DVec3, I64Vec3};
use strata_voxel::ChunkStore;
use strata_voxel::coords::snap_to_voxel;

/// Voxel box scanned around a snapped centre, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColliderExtent {
    /// Voxels scanned below the centre on each axis.
    pub below: I64Vec3,
    /// Voxels scanned above the centre on each axis.
    pub above: I64Vec3,
}

impl ColliderExtent {
    /// A body standing on its snapped position: one voxel around it
    /// horizontally and six voxels up.
    pub const STANDING_BODY: Self = Self {
        below: I64Vec3::new(1, 1, 0),
        above: I64Vec3::new(1, 1, 6),
    };
}

impl Default for ColliderExtent {
    fn default() -> Self {
        Self::STANDING_BODY
    }
}

/// One collision triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceCollider {
    /// Outward normal of the voxel face the triangle belongs to.
    pub normal: DVec3,
    pub points: [DVec3; 3],
}

struct Face {
    v1: DVec3,
    v2: DVec3,
    normal: DVec3,
    flip: bool,
}

fn voxel_faces(voxel: I64Vec3) -> [Face; 6] {
    let c = voxel.as_dvec3();
    let lo = c - DVec3::splat(0.5);
    let hi = c + DVec3::splat(0.5);
    [
        Face {
            v1: DVec3::new(hi.x, lo.y, lo.z),
            v2: hi,
            normal: DVec3::X,
            flip: false,
        },
        Face {
            v1: lo,
            v2: DVec3::new(lo.x, hi.y, hi.z),
            normal: DVec3::NEG_X,
            flip: true,
        },
        Face {
            v1: DVec3::new(lo.x, hi.y, lo.z),
            v2: hi,
            normal: DVec3::Y,
            flip: false,
        },
        Face {
            v1: lo,
            v2: DVec3::new(hi.x, lo.y, hi.z),
            normal: DVec3::NEG_Y,
            flip: true,
        },
        Face {
            v1: DVec3::new(lo.x, lo.y, hi.z),
            v2: hi,
            normal: DVec3::Z,
            flip: false,
        },
        Face {
            v1: lo,
            v2: DVec3::new(hi.x, hi.y, lo.z),
            normal: DVec3::NEG_Z,
            flip: true,
        },
    ]
}

fn push_triangles(face: &Face, out: &mut Vec<FaceCollider>) {
    let Face { v1, v2, normal, flip } = *face;
    let mut v3 = v1;
    let mut v4 = v1;
    if v1.x == v2.x {
        v3.y = v2.y;
        v4.z = v2.z;
    }
    if v1.y == v2.y {
        v3.z = v2.z;
        v4.x = v2.x;
    }
    if v1.z == v2.z {
        v3.x = v2.x;
        v4.y = v2.y;
    }
    if flip {
        std::mem::swap(&mut v3, &mut v4);
    }
    out.push(FaceCollider {
        normal,
        points: [v1, v2, v3],
    });
    out.push(FaceCollider {
        normal,
        points: [v2, v1, v4],
    });
}

/// Collision triangles for the solid voxels in `extent` around `centre`.
///
/// With `assume_solid_if_missing`, voxels in untracked chunks count as
/// solid, so a body cannot fall into terrain that has not streamed in yet.
pub fn face_colliders<M>(
    store: &ChunkStore<M>,
    centre: DVec3,
    extent: ColliderExtent,
    assume_solid_if_missing: bool,
) -> Vec<FaceCollider> {
    let snapped = snap_to_voxel(centre);
    let min = snapped - extent.below;
    let max = snapped + extent.above;

    let mut colliders = Vec::new();
    for x in min.x..=max.x {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                let voxel = I64Vec3::new(x, y, z);
                if !store.get_voxel(voxel, assume_solid_if_missing).is_solid() {
                    continue;
                }
                for face in &voxel_faces(voxel) {
                    push_triangles(face, &mut colliders);
                }
            }
        }
    }
    colliders
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_voxel::{Chunk, ChunkKey, Material, VoxelEdit};

    fn loaded_store() -> ChunkStore {
        let mut store = ChunkStore::new();
        for x in -1..=0 {
            for y in -1..=0 {
                for z in -1..=0 {
                    store.insert_chunk(ChunkKey::new(x, y, z), Chunk::new());
                }
            }
        }
        store
    }

    #[test]
    fn test_single_voxel_gives_twelve_triangles() {
        let mut store = loaded_store();
        store.edit_voxel(I64Vec3::new(0, 0, 2), &VoxelEdit::solid(Material::Stone));
        let colliders = face_colliders(&store, DVec3::ZERO, ColliderExtent::STANDING_BODY, false);
        assert_eq!(colliders.len(), 12);
    }

    #[test]
    fn test_voxels_outside_extent_ignored() {
        let mut store = loaded_store();
        store.edit_voxel(I64Vec3::new(0, 0, -1), &VoxelEdit::solid(Material::Stone));
        store.edit_voxel(I64Vec3::new(2, 0, 0), &VoxelEdit::solid(Material::Stone));
        let colliders = face_colliders(&store, DVec3::ZERO, ColliderExtent::STANDING_BODY, false);
        assert!(colliders.is_empty());
    }

    #[test]
    fn test_missing_chunks_can_be_solid() {
        let store: ChunkStore = ChunkStore::new();
        let open = face_colliders(&store, DVec3::ZERO, ColliderExtent::STANDING_BODY, false);
        assert!(open.is_empty());

        let walled = face_colliders(&store, DVec3::ZERO, ColliderExtent::STANDING_BODY, true);
        // 3 x 3 x 7 voxels, 12 triangles each.
        assert_eq!(walled.len(), 3 * 3 * 7 * 12);
    }

    #[test]
    fn test_triangles_lie_on_their_face() {
        let mut store = loaded_store();
        store.edit_voxel(I64Vec3::ZERO, &VoxelEdit::solid(Material::Stone));
        let colliders = face_colliders(&store, DVec3::ZERO, ColliderExtent::STANDING_BODY, false);
        for collider in &colliders {
            for point in collider.points {
                // Every vertex of a face sits half a voxel out along its normal.
                assert!((point.dot(collider.normal) - 0.5).abs() < 1e-12);
            }
            let [a, b, c] = collider.points;
            let winding = (b - a).cross(c - a);
            assert!(winding.length() > 0.0);
        }
    }

    #[test]
    fn test_winding_faces_outward() {
        let mut store = loaded_store();
        store.edit_voxel(I64Vec3::ZERO, &VoxelEdit::solid(Material::Stone));
        let colliders = face_colliders(&store, DVec3::ZERO, ColliderExtent::STANDING_BODY, false);
        let signs: Vec<f64> = colliders
            .iter()
            .map(|c| {
                let [a, b, v] = c.points;
                (b - a).cross(v - a).dot(c.normal).signum()
            })
            .collect();
        // Both triangles of a face wind the same way.
        for pair in signs.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }
}
