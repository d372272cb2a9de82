//! Point-light shading baked into voxel shade bytes.
//!
//! Each lighting pass rewrites the shades of every solid voxel in a cube
//! around the light. A face is lit when it faces the light and a trace from
//! just in front of it reaches the light unobstructed; everything else in the
//! cube goes dark.

use glam::{DVec3, I64Vec3};
use strata_voxel::ChunkStore;
use strata_voxel::coords::snap_to_voxel;

use crate::voxel_raycast::trace_line;

/// Half-size of the cube a pass touches, in voxels.
pub const LIGHTING_HARD_CUTOFF: i64 = 16;

/// Largest shade value.
pub const MAX_SHADE: f64 = 255.0;

/// Distance in front of a face that its light trace starts from.
const FACE_OFFSET: f64 = 0.55;

/// A point light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: DVec3,
    /// Shade produced at unit distance by a face pointing straight at the light.
    pub brightness: f64,
}

/// Face normals in shade index order: -X, -Y, -Z, +X, +Y, +Z.
const FACE_NORMALS: [DVec3; 6] = [
    DVec3::NEG_X,
    DVec3::NEG_Y,
    DVec3::NEG_Z,
    DVec3::X,
    DVec3::Y,
    DVec3::Z,
];

fn faces_light(voxel: DVec3, normal: DVec3, light: DVec3) -> bool {
    // The face plane sits half a voxel out; it must be strictly behind the light.
    let face = voxel.dot(normal) + 0.5;
    face < light.dot(normal)
}

fn face_shade<M>(store: &ChunkStore<M>, voxel: DVec3, normal: DVec3, light: &Light) -> u8 {
    if !faces_light(voxel, normal, light.position) {
        return 0;
    }
    let from = voxel + normal * FACE_OFFSET;
    let trace = trace_line(store, from, light.position, false);
    if trace.hit {
        return 0;
    }
    let incidence = normal.dot((light.position - from).normalize_or_zero());
    let shade = light.brightness * incidence / (trace.distance * trace.distance);
    // NaN saturates to zero.
    shade.floor().clamp(0.0, MAX_SHADE) as u8
}

/// Shades for the six faces of the voxel at `position`.
pub fn voxel_shades<M>(store: &ChunkStore<M>, position: I64Vec3, light: &Light) -> [u8; 6] {
    let voxel = position.as_dvec3();
    FACE_NORMALS.map(|normal| face_shade(store, voxel, normal, light))
}

/// Relights every solid voxel within [`LIGHTING_HARD_CUTOFF`] of `light`.
///
/// Returns the number of voxels whose shades were rewritten.
pub fn lighting_pass<M>(store: &mut ChunkStore<M>, light: &Light) -> usize {
    let centre = snap_to_voxel(light.position);
    let r = LIGHTING_HARD_CUTOFF;
    let mut lit = 0;

    for x in centre.x - r..=centre.x + r {
        for y in centre.y - r..=centre.y + r {
            for z in centre.z - r..=centre.z + r {
                let position = I64Vec3::new(x, y, z);
                if !store.is_solid(position) {
                    continue;
                }
                let shades = voxel_shades(store, position, light);
                store.set_shades(position, shades);
                lit += 1;
            }
        }
    }
    lit
}
