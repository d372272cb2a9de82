//! Owner of the loaded world: chunks, their lifecycle states, and mesh handles.
//!
//! The [`ChunkStore`] is mutated only by the context that owns it. Reads at
//! positions whose chunk is absent never fail; they resolve to the empty
//! voxel (or a solid one when the caller asks for out-of-bounds safety).

use glam::I64Vec3;
use rustc_hash::FxHashMap;

use crate::chunk::Chunk;
use crate::coords::{ChunkKey, local_to_index, position_to_chunk_key, position_to_local};
use crate::voxel::{EMPTY_VOXEL, FLAG_SOLID, Material, PARAMS_UNLIT, Voxel, VoxelEdit, VoxelWrite};

/// Lifecycle state of a tracked chunk. Untracked chunks have no entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// A generation job is outstanding.
    Loading,
    /// The chunk is resident and editable.
    Loaded,
    /// An unload job owns the chunk's buffer.
    Unloading,
}

/// A mesh handle together with the dispatch timestamp it was built from.
#[derive(Clone, Debug)]
struct MeshSlot<M> {
    mesh: Option<M>,
    timestamp: u64,
}

/// Mapping from chunk key to chunk, plus lifecycle and mesh bookkeeping.
///
/// `M` is the mesh handle type; it is opaque to the store.
#[derive(Debug)]
pub struct ChunkStore<M = ()> {
    chunks: FxHashMap<ChunkKey, Chunk>,
    states: FxHashMap<ChunkKey, ChunkState>,
    meshes: FxHashMap<ChunkKey, MeshSlot<M>>,
    mesh_clock: u64,
}

impl<M> Default for ChunkStore<M> {
    fn default() -> Self {
        Self {
            chunks: FxHashMap::default(),
            states: FxHashMap::default(),
            meshes: FxHashMap::default(),
            mesh_clock: 0,
        }
    }
}

impl<M> ChunkStore<M> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Chunk map ---

    /// Inserts (or replaces) a chunk.
    pub fn insert_chunk(&mut self, key: ChunkKey, chunk: Chunk) {
        self.chunks.insert(key, chunk);
    }

    /// Removes and returns a chunk, transferring ownership of its buffer.
    pub fn take_chunk(&mut self, key: ChunkKey) -> Option<Chunk> {
        self.chunks.remove(&key)
    }

    /// Returns the chunk at `key`, if resident.
    pub fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        self.chunks.get(&key)
    }

    /// Returns the chunk at `key` mutably, if resident.
    pub fn chunk_mut(&mut self, key: ChunkKey) -> Option<&mut Chunk> {
        self.chunks.get_mut(&key)
    }

    /// Whether a chunk is resident at `key`.
    pub fn contains_chunk(&self, key: ChunkKey) -> bool {
        self.chunks.contains_key(&key)
    }

    /// Keys of all resident chunks, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of resident chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Keys of resident chunks whose `modified` flag is set.
    pub fn modified_keys(&self) -> Vec<ChunkKey> {
        self.chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_modified())
            .map(|(key, _)| *key)
            .collect()
    }

    // --- Lifecycle states ---

    /// Lifecycle state of `key`, or `None` if untracked.
    pub fn state(&self, key: ChunkKey) -> Option<ChunkState> {
        self.states.get(&key).copied()
    }

    /// Records the lifecycle state of `key`.
    pub fn set_state(&mut self, key: ChunkKey, state: ChunkState) {
        self.states.insert(key, state);
    }

    /// Stops tracking `key`.
    pub fn clear_state(&mut self, key: ChunkKey) {
        self.states.remove(&key);
    }

    /// Keys currently in `state`.
    pub fn keys_in_state(&self, state: ChunkState) -> Vec<ChunkKey> {
        self.states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(key, _)| *key)
            .collect()
    }

    // --- Mesh handles ---

    /// Returns a fresh mesh timestamp, strictly greater than every previous one.
    pub fn next_mesh_timestamp(&mut self) -> u64 {
        self.mesh_clock += 1;
        self.mesh_clock
    }

    /// Installs a mesh built from data dispatched at `timestamp`.
    ///
    /// Ignored (returns false) when the chunk is not resident or a mesh with
    /// an equal or newer timestamp has already been applied. `None` clears
    /// the handle but still records the timestamp.
    pub fn apply_mesh(&mut self, key: ChunkKey, mesh: Option<M>, timestamp: u64) -> bool {
        if !self.chunks.contains_key(&key) {
            return false;
        }
        if let Some(slot) = self.meshes.get(&key)
            && slot.timestamp >= timestamp
        {
            return false;
        }
        self.meshes.insert(key, MeshSlot { mesh, timestamp });
        true
    }

    /// The current mesh handle for `key`.
    pub fn mesh(&self, key: ChunkKey) -> Option<&M> {
        self.meshes.get(&key).and_then(|slot| slot.mesh.as_ref())
    }

    /// Timestamp of the last mesh applied to `key`.
    pub fn mesh_timestamp(&self, key: ChunkKey) -> Option<u64> {
        self.meshes.get(&key).map(|slot| slot.timestamp)
    }

    /// Drops the mesh handle and its timestamp.
    pub fn remove_mesh(&mut self, key: ChunkKey) -> Option<M> {
        self.meshes.remove(&key).and_then(|slot| slot.mesh)
    }

    /// Iterates over every present mesh handle.
    pub fn meshes(&self) -> impl Iterator<Item = (ChunkKey, &M)> + '_ {
        self.meshes
            .iter()
            .filter_map(|(key, slot)| slot.mesh.as_ref().map(|mesh| (*key, mesh)))
    }

    // --- Voxel access ---

    /// Reads the voxel at a world position.
    ///
    /// An absent chunk reads as [`EMPTY_VOXEL`], with the solid flag set when
    /// `assume_solid_if_missing` is true.
    pub fn get_voxel(&self, position: I64Vec3, assume_solid_if_missing: bool) -> Voxel {
        match self.chunks.get(&position_to_chunk_key(position)) {
            Some(chunk) => chunk.get(local_to_index(position_to_local(position))),
            None if assume_solid_if_missing => Voxel {
                flags: EMPTY_VOXEL.flags | FLAG_SOLID,
                ..EMPTY_VOXEL
            },
            None => EMPTY_VOXEL,
        }
    }

    /// Whether the voxel at `position` is solid; absent chunks are air.
    pub fn is_solid(&self, position: I64Vec3) -> bool {
        self.get_voxel(position, false).is_solid()
    }

    /// Whether the voxel at `position` carries the reserved flag.
    pub fn is_reserved(&self, position: I64Vec3) -> bool {
        self.get_voxel(position, false).is_reserved()
    }

    /// Material at `position`.
    pub fn material_at(&self, position: I64Vec3) -> Material {
        self.get_voxel(position, false).material()
    }

    /// Applies a byte-level write. No-op if the chunk is absent.
    ///
    /// Returns true if the chunk was marked modified by this write.
    pub fn set_voxel(&mut self, position: I64Vec3, write: &VoxelWrite) -> bool {
        let Some(chunk) = self.chunks.get_mut(&position_to_chunk_key(position)) else {
            return false;
        };
        chunk.set(local_to_index(position_to_local(position)), write)
    }

    /// Applies a partial voxel edit. This is the mutation entry point for
    /// gameplay code; edits against absent chunks are silently dropped.
    pub fn edit_voxel(&mut self, position: I64Vec3, edit: &VoxelEdit) -> bool {
        self.set_voxel(position, &edit.to_write())
    }

    /// Sets or clears solidity.
    pub fn set_solid(&mut self, position: I64Vec3, solid: bool) -> bool {
        let edit = VoxelEdit {
            solid: Some(solid),
            ..VoxelEdit::default()
        };
        self.edit_voxel(position, &edit)
    }

    /// Sets the material.
    pub fn set_material(&mut self, position: I64Vec3, material: Material) -> bool {
        let edit = VoxelEdit {
            material: Some(material),
            ..VoxelEdit::default()
        };
        self.edit_voxel(position, &edit)
    }

    /// Replaces all six shades.
    pub fn set_shades(&mut self, position: I64Vec3, shades: [u8; 6]) -> bool {
        let edit = VoxelEdit {
            shades: Some(shades),
            ..VoxelEdit::default()
        };
        self.edit_voxel(position, &edit)
    }

    /// Replaces a single shade; `face` uses the shade index order.
    pub fn set_shade(&mut self, position: I64Vec3, face: usize, shade: u8) -> bool {
        let mut write = VoxelWrite::default();
        write.fields[PARAMS_UNLIT + face] = Some(shade);
        self.set_voxel(position, &write)
    }
}
