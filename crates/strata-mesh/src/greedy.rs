//! Greedy meshing: collects the exposed faces of a chunk and merges
//! same-colored neighbours into larger quads.
//!
//! Faces are merged per direction, one axis at a time (X, then Y, then Z),
//! skipping the axis the face is flat in. A later axis only absorbs faces
//! whose extent along the earlier axes matches, so merged faces stay
//! rectangular. Faces are scanned in the order they were collected.

use rustc_hash::FxHashMap;
use strata_voxel::coords::local_to_index;
use strata_voxel::{CHUNK_SIZE, Chunk, VoxelMode};

use crate::chunk_mesh::ChunkMesh;
use crate::face_direction::FaceDirection;
use crate::palette::{Palette, Rgb, palette};

/// An exposed face: min corner, max corner, color.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Face {
    min: [f32; 3],
    max: [f32; 3],
    color: Rgb,
}

/// Faces of one direction, in collection order, with lookup by voxel position.
#[derive(Default)]
struct FaceSet {
    faces: Vec<Option<Face>>,
    keys: Vec<[i32; 3]>,
    by_position: FxHashMap<[i32; 3], usize>,
}

impl FaceSet {
    fn insert(&mut self, position: [i32; 3], face: Face) {
        self.by_position.insert(position, self.faces.len());
        self.keys.push(position);
        self.faces.push(Some(face));
    }

    /// Merges faces along `axis`, requiring equal max extent on every axis
    /// below it.
    fn merge_along(&mut self, axis: usize) {
        for i in 0..self.faces.len() {
            let Some(face) = self.faces[i] else {
                continue;
            };
            let mut grown = face;
            let mut step = 1;
            loop {
                let mut key = self.keys[i];
                key[axis] += step;
                let Some(&j) = self.by_position.get(&key) else {
                    break;
                };
                let Some(other) = self.faces[j] else {
                    break;
                };
                let extents_match = (0..axis).all(|a| grown.max[a] == other.max[a]);
                if other.color != grown.color || !extents_match {
                    break;
                }
                self.faces[j] = None;
                grown.max[axis] += 1.0;
                step += 1;
            }
            self.faces[i] = Some(grown);
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter().flatten()
    }
}

fn is_solid_local(chunk: &Chunk, x: i32, y: i32, z: i32) -> bool {
    let size = CHUNK_SIZE as i32;
    if !(0..size).contains(&x) || !(0..size).contains(&y) || !(0..size).contains(&z) {
        return false;
    }
    chunk
        .get(local_to_index([x as usize, y as usize, z as usize]))
        .is_solid()
}

/// Collects every exposed face, grouped by direction.
fn collect_faces(chunk: &Chunk, palette: &Palette) -> [FaceSet; 6] {
    let mut sets: [FaceSet; 6] = Default::default();
    let size = CHUNK_SIZE as i32;

    for x in 0..size {
        for y in 0..size {
            for z in 0..size {
                let voxel = chunk.get(local_to_index([x as usize, y as usize, z as usize]));
                if !voxel.is_solid() {
                    continue;
                }
                let material = voxel.material();
                let centre = [x as f32, y as f32, z as f32];

                for direction in FaceDirection::MERGE_ORDER {
                    let (nx, ny, nz) = direction.offset(x, y, z);
                    if is_solid_local(chunk, nx, ny, nz) {
                        continue;
                    }
                    let axis = direction.axis();
                    let plane = centre[axis] + if direction.is_negative() { -0.5 } else { 0.5 };
                    let mut min = centre.map(|c| c - 0.5);
                    let mut max = centre.map(|c| c + 0.5);
                    min[axis] = plane;
                    max[axis] = plane;

                    let color = palette.color(material, voxel.shades[direction.index()]);
                    sets[direction.index()].insert([x, y, z], Face { min, max, color });
                }
            }
        }
    }
    sets
}

/// Builds the mesh for a chunk. Neighbouring chunks are not consulted;
/// faces on the chunk boundary are always emitted.
pub fn greedy_mesh(chunk: &Chunk) -> ChunkMesh {
    let mut mesh = ChunkMesh::new();
    if chunk.mode() == VoxelMode::Air {
        return mesh;
    }

    let mut sets = collect_faces(chunk, palette());

    for direction in FaceDirection::MERGE_ORDER {
        let set = &mut sets[direction.index()];
        for axis in 0..3 {
            if axis != direction.axis() {
                set.merge_along(axis);
            }
        }
    }

    for direction in FaceDirection::EMIT_ORDER {
        for face in sets[direction.index()].iter() {
            mesh.push_quad(direction, face.min, face.max, face.color);
        }
    }

    mesh
}
