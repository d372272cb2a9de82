//! Packed voxel storage for one chunk in three density modes.
//!
//! | Mode    | Bytes per voxel | Contents                         |
//! |---------|-----------------|----------------------------------|
//! | `Air`   | 0               | nothing; every voxel is empty    |
//! | `Unlit` | 2               | material, flags                  |
//! | `Lit`   | 8               | material, flags, six shade bytes |
//!
//! Mode changes only go upward and are explicit conversions that return a
//! new buffer. Voxels are addressed by [`local_to_index`](crate::coords::local_to_index).

use crate::chunk::CHUNK_VOLUME;
use crate::voxel::{EMPTY_VOXEL, PARAMS_LIT, PARAMS_UNLIT, Voxel, VoxelWrite};

/// Density mode of a [`VoxelBuffer`]. Ordered by density.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum VoxelMode {
    Air = 0,
    Unlit = 1,
    Lit = 2,
}

impl VoxelMode {
    /// Bytes stored per voxel in this mode.
    pub fn bytes_per_voxel(self) -> usize {
        match self {
            Self::Air => 0,
            Self::Unlit => PARAMS_UNLIT,
            Self::Lit => PARAMS_LIT,
        }
    }

    /// Decodes the mode byte used by the chunk record format.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Air),
            1 => Some(Self::Unlit),
            2 => Some(Self::Lit),
            _ => None,
        }
    }
}

/// A chunk's voxel bytes.
///
/// Invariant: the byte slice of `Unlit`/`Lit` is exactly
/// `CHUNK_VOLUME * mode.bytes_per_voxel()` long.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum VoxelBuffer {
    #[default]
    Air,
    Unlit(Box<[u8]>),
    Lit(Box<[u8]>),
}

impl VoxelBuffer {
    /// Rebuilds a buffer from raw bytes. Returns `None` if the length does not
    /// match the mode.
    pub fn from_raw(mode: VoxelMode, bytes: Vec<u8>) -> Option<Self> {
        if bytes.len() != CHUNK_VOLUME * mode.bytes_per_voxel() {
            return None;
        }
        Some(match mode {
            VoxelMode::Air => Self::Air,
            VoxelMode::Unlit => Self::Unlit(bytes.into_boxed_slice()),
            VoxelMode::Lit => Self::Lit(bytes.into_boxed_slice()),
        })
    }

    /// Current density mode.
    pub fn mode(&self) -> VoxelMode {
        match self {
            Self::Air => VoxelMode::Air,
            Self::Unlit(_) => VoxelMode::Unlit,
            Self::Lit(_) => VoxelMode::Lit,
        }
    }

    /// Raw bytes (empty for `Air`).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Air => &[],
            Self::Unlit(bytes) | Self::Lit(bytes) => bytes,
        }
    }

    /// Reads one byte field of the voxel at `index`.
    ///
    /// Shade fields of an unlit voxel and every field of an air buffer read
    /// from [`EMPTY_VOXEL`].
    pub fn get_field(&self, index: usize, field: usize) -> u8 {
        debug_assert!(index < CHUNK_VOLUME && field < PARAMS_LIT);
        let empty = EMPTY_VOXEL.to_bytes();
        match self {
            Self::Air => empty[field],
            Self::Unlit(bytes) if field < PARAMS_UNLIT => bytes[index * PARAMS_UNLIT + field],
            Self::Unlit(_) => empty[field],
            Self::Lit(bytes) => bytes[index * PARAMS_LIT + field],
        }
    }

    /// Reads the full voxel at `index`.
    pub fn get(&self, index: usize) -> Voxel {
        debug_assert!(index < CHUNK_VOLUME);
        match self {
            Self::Air => EMPTY_VOXEL,
            Self::Unlit(bytes) => {
                let base = index * PARAMS_UNLIT;
                Voxel {
                    material: bytes[base],
                    flags: bytes[base + 1],
                    ..EMPTY_VOXEL
                }
            }
            Self::Lit(bytes) => {
                let base = index * PARAMS_LIT;
                let mut lit = [0u8; PARAMS_LIT];
                lit.copy_from_slice(&bytes[base..base + PARAMS_LIT]);
                Voxel::from_bytes(lit)
            }
        }
    }

    /// Converts this buffer to `to`, preserving every stored byte.
    ///
    /// New unlit fields come from [`EMPTY_VOXEL`]; new shade fields get
    /// [`DEFAULT_SHADING`](crate::voxel::DEFAULT_SHADING). Requests for a mode
    /// at or below the current one return the buffer unchanged.
    pub fn upgrade(self, to: VoxelMode) -> VoxelBuffer {
        if to <= self.mode() {
            return self;
        }
        let empty = EMPTY_VOXEL.to_bytes();
        match (self, to) {
            (Self::Air, VoxelMode::Unlit) => {
                Self::Unlit(empty[..PARAMS_UNLIT].repeat(CHUNK_VOLUME).into_boxed_slice())
            }
            (Self::Air, VoxelMode::Lit) => Self::Lit(empty.repeat(CHUNK_VOLUME).into_boxed_slice()),
            (Self::Unlit(unlit), _) => {
                let mut lit = Vec::with_capacity(CHUNK_VOLUME * PARAMS_LIT);
                for voxel in unlit.chunks_exact(PARAMS_UNLIT) {
                    lit.extend_from_slice(voxel);
                    lit.extend_from_slice(&empty[PARAMS_UNLIT..]);
                }
                Self::Lit(lit.into_boxed_slice())
            }
            (buffer, _) => buffer,
        }
    }

    /// Applies a sparse write to the voxel at `index`.
    ///
    /// Upgrades to `Lit` if the write touches a shade byte, otherwise to at
    /// least `Unlit`. Returns true if the change is visible to meshing or
    /// collision: solidity flipped, or the voxel is solid afterwards and its
    /// material or shading changed.
    pub fn set(&mut self, index: usize, write: &VoxelWrite) -> bool {
        debug_assert!(index < CHUNK_VOLUME);
        let needed = if write.touches_shading() {
            VoxelMode::Lit
        } else {
            VoxelMode::Unlit
        };
        if self.mode() < needed {
            *self = std::mem::take(self).upgrade(needed);
        }

        let before = self.get(index);
        let (bytes, stride) = match self {
            Self::Air => return false,
            Self::Unlit(bytes) => (bytes, PARAMS_UNLIT),
            Self::Lit(bytes) => (bytes, PARAMS_LIT),
        };
        let voxel = &mut bytes[index * stride..(index + 1) * stride];
        for (slot, field) in voxel.iter_mut().zip(write.fields) {
            if let Some(value) = field {
                *slot = value;
            }
        }
        voxel[1] |= write.flags_add;
        voxel[1] &= !write.flags_remove;
        let after = self.get(index);

        if before.is_solid() != after.is_solid() {
            return true;
        }
        after.is_solid() && (before.material != after.material || before.shades != after.shades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::{DEFAULT_SHADING, FLAG_SOLID, Material, VoxelEdit};

    #[test]
    fn test_air_reads_empty_voxel() {
        let buffer = VoxelBuffer::Air;
        assert_eq!(buffer.get(123), EMPTY_VOXEL);
        assert_eq!(buffer.get_field(123, 4), DEFAULT_SHADING[2]);
        assert!(buffer.as_bytes().is_empty());
    }

    #[test]
    fn test_upgrade_lengths() {
        let unlit = VoxelBuffer::Air.upgrade(VoxelMode::Unlit);
        assert_eq!(unlit.as_bytes().len(), CHUNK_VOLUME * PARAMS_UNLIT);
        let lit = unlit.upgrade(VoxelMode::Lit);
        assert_eq!(lit.as_bytes().len(), CHUNK_VOLUME * PARAMS_LIT);
        let direct = VoxelBuffer::Air.upgrade(VoxelMode::Lit);
        assert_eq!(direct, lit);
    }

    #[test]
    fn test_upgrade_never_downgrades() {
        let lit = VoxelBuffer::Air.upgrade(VoxelMode::Lit);
        assert_eq!(lit.clone().upgrade(VoxelMode::Unlit), lit);
        assert_eq!(lit.clone().upgrade(VoxelMode::Air), lit);
    }

    #[test]
    fn test_unlit_to_lit_preserves_bytes_and_defaults_shading() {
        let mut buffer = VoxelBuffer::Air;
        buffer.set(7, &VoxelEdit::solid(Material::Stone).to_write());
        buffer.set(900, &VoxelEdit::solid(Material::Metal).to_write());
        assert_eq!(buffer.mode(), VoxelMode::Unlit);
        assert_eq!(buffer.get(7).shades, DEFAULT_SHADING);

        let lit = buffer.clone().upgrade(VoxelMode::Lit);
        for index in 0..CHUNK_VOLUME {
            assert_eq!(lit.get_field(index, 0), buffer.get_field(index, 0));
            assert_eq!(lit.get_field(index, 1), buffer.get_field(index, 1));
            assert_eq!(lit.get(index).shades, DEFAULT_SHADING);
        }
    }

    #[test]
    fn test_shade_write_upgrades_to_lit() {
        let mut buffer = VoxelBuffer::Air;
        let mut write = VoxelWrite::default();
        write.fields[3] = Some(10);
        buffer.set(0, &write);
        assert_eq!(buffer.mode(), VoxelMode::Lit);
        assert_eq!(buffer.get(0).shades[1], 10);
        assert_eq!(buffer.get(0).shades[0], DEFAULT_SHADING[0]);
    }

    #[test]
    fn test_set_reports_solidity_flip() {
        let mut buffer = VoxelBuffer::Air;
        assert!(buffer.set(5, &VoxelEdit::solid(Material::Dirt).to_write()));
        assert!(buffer.get(5).is_solid());
        assert!(buffer.set(5, &VoxelEdit::air().to_write()));
        assert!(!buffer.get(5).is_solid());
    }

    #[test]
    fn test_set_identical_write_reports_no_change() {
        let mut buffer = VoxelBuffer::Air;
        let write = VoxelEdit::solid(Material::Grass).to_write();
        assert!(buffer.set(5, &write));
        assert!(!buffer.set(5, &write));
    }

    #[test]
    fn test_cosmetic_change_on_air_voxel_is_not_relevant() {
        let mut buffer = VoxelBuffer::Air;
        let edit = VoxelEdit {
            material: Some(Material::Crystal),
            shades: Some([1, 2, 3, 4, 5, 6]),
            ..VoxelEdit::default()
        };
        assert!(!buffer.set(5, &edit.to_write()));
        assert_eq!(buffer.get(5).material(), Material::Crystal);
    }

    #[test]
    fn test_material_change_on_solid_voxel_is_relevant() {
        let mut buffer = VoxelBuffer::Air;
        buffer.set(5, &VoxelEdit::solid(Material::Grass).to_write());
        let mut write = VoxelWrite::default();
        write.fields[0] = Some(Material::Stone.index());
        assert!(buffer.set(5, &write));
    }

    #[test]
    fn test_flag_masks() {
        let mut buffer = VoxelBuffer::Air;
        let write = VoxelWrite {
            flags_add: FLAG_SOLID | 2,
            ..VoxelWrite::default()
        };
        buffer.set(1, &write);
        assert!(buffer.get(1).is_solid());
        assert!(buffer.get(1).is_reserved());
        let write = VoxelWrite {
            flags_remove: 2,
            ..VoxelWrite::default()
        };
        buffer.set(1, &write);
        assert!(buffer.get(1).is_solid());
        assert!(!buffer.get(1).is_reserved());
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        assert!(VoxelBuffer::from_raw(VoxelMode::Unlit, vec![0; 10]).is_none());
        assert!(VoxelBuffer::from_raw(VoxelMode::Air, Vec::new()).is_some());
    }
}
