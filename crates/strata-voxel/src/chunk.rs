//! A 32×32×32 chunk: its voxel buffer plus the re-mesh flag.

use crate::buffer::{VoxelBuffer, VoxelMode};
use crate::voxel::{Voxel, VoxelWrite};

/// Side length of a chunk in voxels.
pub const CHUNK_SIZE: usize = 32;

/// Total number of voxels in a chunk (32³).
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// One chunk of the world.
///
/// `modified` is set by writes that change what the chunk looks like or how
/// it collides, and cleared when a re-mesh job is queued for it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chunk {
    buffer: VoxelBuffer,
    modified: bool,
}

impl Chunk {
    /// Creates an all-air chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing buffer. The chunk starts unmodified.
    pub fn from_buffer(buffer: VoxelBuffer) -> Self {
        Self {
            buffer,
            modified: false,
        }
    }

    /// The voxel buffer.
    pub fn buffer(&self) -> &VoxelBuffer {
        &self.buffer
    }

    /// Consumes the chunk, returning its buffer.
    pub fn into_buffer(self) -> VoxelBuffer {
        self.buffer
    }

    /// Current density mode.
    pub fn mode(&self) -> VoxelMode {
        self.buffer.mode()
    }

    /// Reads the voxel at a linear index.
    pub fn get(&self, index: usize) -> Voxel {
        self.buffer.get(index)
    }

    /// Writes the voxel at a linear index, raising `modified` on relevant changes.
    ///
    /// Returns true if the write was relevant.
    pub fn set(&mut self, index: usize, write: &VoxelWrite) -> bool {
        let relevant = self.buffer.set(index, write);
        self.modified |= relevant;
        relevant
    }

    /// Whether the chunk needs re-meshing.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clears the re-mesh flag, returning its previous value.
    pub fn take_modified(&mut self) -> bool {
        std::mem::replace(&mut self.modified, false)
    }

    /// Sets the re-mesh flag explicitly.
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::{Material, VoxelEdit};

    #[test]
    fn test_new_chunk_is_air_and_clean() {
        let chunk = Chunk::new();
        assert_eq!(chunk.mode(), VoxelMode::Air);
        assert!(!chunk.is_modified());
    }

    #[test]
    fn test_relevant_write_sets_modified() {
        let mut chunk = Chunk::new();
        chunk.set(0, &VoxelEdit::solid(Material::Sand).to_write());
        assert!(chunk.is_modified());
        assert!(chunk.take_modified());
        assert!(!chunk.is_modified());
    }

    #[test]
    fn test_irrelevant_write_keeps_clean() {
        let mut chunk = Chunk::new();
        let edit = VoxelEdit {
            material: Some(Material::Wood),
            ..VoxelEdit::default()
        };
        chunk.set(0, &edit.to_write());
        assert!(!chunk.is_modified());
        assert_eq!(chunk.mode(), VoxelMode::Unlit);
    }
}
