//! Chunk mesh data: a flat triangle list ready for GPU upload.

use crate::face_direction::FaceDirection;
use crate::palette::{Rgb, color_map_coords};

/// Number of `f32` values per vertex: position (3), uv (2), normal (3).
pub const FLOATS_PER_VERTEX: usize = 8;

/// Two triangles per quad, no index buffer.
pub const VERTICES_PER_QUAD: usize = 6;

/// A single vertex in a chunk mesh.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local coordinates; voxel centres sit on integers.
    pub position: [f32; 3],
    /// Color-map texture coordinates.
    pub uv: [f32; 2],
    /// Face normal.
    pub normal: [f32; 3],
}

static_assertions::assert_eq_size!(MeshVertex, [f32; FLOATS_PER_VERTEX]);

/// Metadata for a single merged quad, used for analysis and debugging.
#[derive(Clone, Copy, Debug)]
pub struct QuadInfo {
    /// Which face direction this quad belongs to.
    pub direction: FaceDirection,
}

/// The mesh output of a chunk meshing pass.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    /// Triangle-list vertices, six per quad.
    pub vertices: Vec<MeshVertex>,
    /// One entry per emitted quad, for debugging / statistics.
    pub quads: Vec<QuadInfo>,
}

impl ChunkMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a merged face spanning `v1` (min corner) to `v2` (max corner).
    ///
    /// The two remaining corners are derived from whichever axis the face is
    /// flat in; negative-facing quads swap them to reverse the winding.
    pub fn push_quad(&mut self, direction: FaceDirection, v1: [f32; 3], v2: [f32; 3], color: Rgb) {
        let mut v3 = v1;
        let mut v4 = v1;
        if v1[0] == v2[0] {
            v3[1] = v2[1];
            v4[2] = v2[2];
        }
        if v1[1] == v2[1] {
            v3[2] = v2[2];
            v4[0] = v2[0];
        }
        if v1[2] == v2[2] {
            v3[0] = v2[0];
            v4[1] = v2[1];
        }
        if direction.is_negative() {
            std::mem::swap(&mut v3, &mut v4);
        }

        let uv = color_map_coords(color);
        let normal = direction.normal();
        for position in [v1, v2, v3, v2, v1, v4] {
            self.vertices.push(MeshVertex {
                position,
                uv,
                normal,
            });
        }
        self.quads.push(QuadInfo { direction });
    }

    /// Counts the number of quads emitted for a specific face direction.
    pub fn count_quads_for_direction(&self, direction: FaceDirection) -> usize {
        self.quads
            .iter()
            .filter(|q| q.direction == direction)
            .count()
    }

    /// Returns the total number of quads in the mesh.
    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    /// Returns the total number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// True if the mesh has no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
