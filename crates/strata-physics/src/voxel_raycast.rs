//! Voxel line tracing.
//!
//! Walks a segment through the voxel grid one boundary crossing at a time
//! (DDA), testing the voxel just past each crossing. Voxel centres sit on
//! integer coordinates, so voxel faces lie on the half-integers.

use glam::{DVec3, I64Vec3};
use strata_voxel::coords::snap_to_voxel;
use strata_voxel::{ChunkStore, Structure};

/// Nudge applied against the hit normal so the next test lands inside the
/// voxel just crossed into.
const FACE_EPSILON: f64 = 0.0001;

/// Boundary distances below this are treated as "already on it".
const MIN_STEP: f64 = 0.000001;

/// Solidity lookup used by [`trace_line`].
pub trait SolidityLookup {
    /// Whether the voxel at `position` blocks traces.
    fn is_solid_at(&self, position: I64Vec3) -> bool;
}

impl<M> SolidityLookup for ChunkStore<M> {
    /// Untracked chunks are air.
    fn is_solid_at(&self, position: I64Vec3) -> bool {
        self.is_solid(position)
    }
}

impl SolidityLookup for Structure {
    fn is_solid_at(&self, position: I64Vec3) -> bool {
        self.is_solid(position)
    }
}

/// Outcome of [`trace_line`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceResult {
    /// Whether a solid voxel was hit.
    pub hit: bool,
    /// The voxel that was hit, or the voxel at the segment end on a miss.
    pub voxel: I64Vec3,
    /// Point on the hit face, or the segment end on a miss.
    pub position: DVec3,
    /// Outward normal of the hit face. Zero on a miss or a start-voxel hit.
    pub normal: DVec3,
    /// Axis of the hit face (0 = x, 1 = y, 2 = z).
    pub axis: Option<usize>,
    /// Distance travelled from `start`.
    pub distance: f64,
}

fn boundary_distance(current: f64, direction: f64, positive: bool) -> f64 {
    let target = if positive { 1.0 } else { 0.0 };
    let dist = ((target - (current + 0.5).rem_euclid(1.0)) / direction).abs();
    // NaN (zero direction) fails the comparison too.
    if dist >= MIN_STEP { dist } else { f64::INFINITY }
}

/// Traces the segment `start..end` against `lookup`.
///
/// With `ignore_first_voxel`, the voxel containing `start` is never reported,
/// which lets a trace begin inside solid ground.
pub fn trace_line<L: SolidityLookup + ?Sized>(
    lookup: &L,
    start: DVec3,
    end: DVec3,
    ignore_first_voxel: bool,
) -> TraceResult {
    let total = start.distance(end);

    if !ignore_first_voxel {
        let voxel = snap_to_voxel(start);
        if lookup.is_solid_at(voxel) {
            return TraceResult {
                hit: true,
                voxel,
                position: start,
                normal: DVec3::ZERO,
                axis: None,
                distance: 0.0,
            };
        }
    }

    let positive = [end.x > start.x, end.y > start.y, end.z > start.z];
    let direction = (end - start).normalize_or_zero();
    let mut current = start;
    let mut left = total;

    while left > 0.0 {
        let dists = [
            boundary_distance(current.x, direction.x, positive[0]),
            boundary_distance(current.y, direction.y, positive[1]),
            boundary_distance(current.z, direction.z, positive[2]),
        ];

        let axis = if dists[0] < dists[1] {
            if dists[0] < dists[2] { 0 } else { 2 }
        } else if dists[1] < dists[2] {
            1
        } else {
            2
        };

        let mut normal = DVec3::ZERO;
        normal[axis] = if positive[axis] { -1.0 } else { 1.0 };

        let step = dists[axis].min(left);
        left -= step;

        let hit_position = current + direction * step;
        current = hit_position - normal * FACE_EPSILON;

        let voxel = snap_to_voxel(current);
        if lookup.is_solid_at(voxel) {
            return TraceResult {
                hit: true,
                voxel,
                position: hit_position,
                normal,
                axis: Some(axis),
                distance: total - left,
            };
        }
    }

    TraceResult {
        hit: false,
        voxel: snap_to_voxel(end),
        position: end,
        normal: DVec3::ZERO,
        axis: None,
        distance: total,
    }
}
