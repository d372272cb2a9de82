//! The voxel value type, the fixed material palette, and partial voxel edits.
//!
//! A voxel is eight bytes: `[material, flags, shade0..shade5]`. Shade bytes
//! are ordered `[-X, -Y, -Z, +X, +Y, +Z]` (west, north, down, east, south, up).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of bytes per voxel in an unlit buffer (material, flags).
pub const PARAMS_UNLIT: usize = 2;

/// Number of bytes per voxel in a lit buffer (material, flags, 6 shades).
pub const PARAMS_LIT: usize = 8;

/// Flag bit: the voxel blocks movement, rays, and is meshed.
pub const FLAG_SOLID: u8 = 1;

/// Flag bit: the voxel is claimed by a placed structure.
pub const FLAG_RESERVED: u8 = 2;

/// Shading assigned to voxels that have never been lit, brightest on top.
pub const DEFAULT_SHADING: [u8; 6] = [153, 127, 102, 179, 204, 255];

/// The voxel every unwritten position reads as.
pub const EMPTY_VOXEL: Voxel = Voxel {
    material: 1,
    flags: 0,
    shades: DEFAULT_SHADING,
};

/// Entry of the fixed material palette.
///
/// The `repr(u8)` discriminant is the byte stored in voxel buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum Material {
    Placeholder = 0,
    Structure = 1,
    Grass = 2,
    Leaves = 3,
    Vines = 4,
    Fruit = 5,
    Flower = 6,
    Bark = 7,
    Wood = 8,
    Dirt = 9,
    Sand = 10,
    Stone = 11,
    StoneAccent = 12,
    StoneAccent2 = 13,
    StoneRoof = 14,
    Metal = 15,
    MetalAccent = 16,
    Sign = 17,
    SignText = 18,
    Bone = 19,
    Rune = 20,
    Crystal = 21,
}

impl Material {
    /// Every material in palette order.
    pub const ALL: [Material; 22] = [
        Self::Placeholder,
        Self::Structure,
        Self::Grass,
        Self::Leaves,
        Self::Vines,
        Self::Fruit,
        Self::Flower,
        Self::Bark,
        Self::Wood,
        Self::Dirt,
        Self::Sand,
        Self::Stone,
        Self::StoneAccent,
        Self::StoneAccent2,
        Self::StoneRoof,
        Self::Metal,
        Self::MetalAccent,
        Self::Sign,
        Self::SignText,
        Self::Bone,
        Self::Rune,
        Self::Crystal,
    ];

    /// Decodes a stored material byte. Unknown values decode to `Structure`.
    pub fn from_index(index: u8) -> Self {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(Self::Structure)
    }

    /// The byte stored in voxel buffers for this material.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Asset-facing name, e.g. `"stoneAccent2"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Placeholder => "placeholder",
            Self::Structure => "structure",
            Self::Grass => "grass",
            Self::Leaves => "leaves",
            Self::Vines => "vines",
            Self::Fruit => "fruit",
            Self::Flower => "flower",
            Self::Bark => "bark",
            Self::Wood => "wood",
            Self::Dirt => "dirt",
            Self::Sand => "sand",
            Self::Stone => "stone",
            Self::StoneAccent => "stoneAccent",
            Self::StoneAccent2 => "stoneAccent2",
            Self::StoneRoof => "stoneRoof",
            Self::Metal => "metal",
            Self::MetalAccent => "metalAccent",
            Self::Sign => "sign",
            Self::SignText => "signText",
            Self::Bone => "bone",
            Self::Rune => "rune",
            Self::Crystal => "crystal",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = std::convert::Infallible;

    /// Unknown names resolve to `Structure`, matching byte decoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .unwrap_or(Self::Structure))
    }
}

/// A fully resolved voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Voxel {
    /// Material palette index.
    pub material: u8,
    /// Flag bits ([`FLAG_SOLID`], [`FLAG_RESERVED`]).
    pub flags: u8,
    /// Per-face shading, `[-X, -Y, -Z, +X, +Y, +Z]`.
    pub shades: [u8; 6],
}

impl Voxel {
    /// Builds a voxel from its eight-byte lit representation.
    pub fn from_bytes(bytes: [u8; PARAMS_LIT]) -> Self {
        Self {
            material: bytes[0],
            flags: bytes[1],
            shades: [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]],
        }
    }

    /// Returns the eight-byte lit representation.
    pub fn to_bytes(self) -> [u8; PARAMS_LIT] {
        let s = self.shades;
        [self.material, self.flags, s[0], s[1], s[2], s[3], s[4], s[5]]
    }

    /// Whether [`FLAG_SOLID`] is set.
    pub fn is_solid(&self) -> bool {
        self.flags & FLAG_SOLID != 0
    }

    /// Whether [`FLAG_RESERVED`] is set.
    pub fn is_reserved(&self) -> bool {
        self.flags & FLAG_RESERVED != 0
    }

    /// Decoded material.
    pub fn material(&self) -> Material {
        Material::from_index(self.material)
    }
}

impl Default for Voxel {
    fn default() -> Self {
        EMPTY_VOXEL
    }
}

/// Low-level sparse write against a voxel buffer.
///
/// `fields[i]` overwrites byte `i` of the voxel when set. After the overwrite
/// `flags_add` is OR-ed into the flag byte and `flags_remove` is cleared from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoxelWrite {
    pub fields: [Option<u8>; PARAMS_LIT],
    pub flags_add: u8,
    pub flags_remove: u8,
}

impl VoxelWrite {
    /// Returns true if the write touches any shading byte.
    pub fn touches_shading(&self) -> bool {
        self.fields[PARAMS_UNLIT..].iter().any(Option::is_some)
    }
}

/// High-level partial voxel: the fields a structure or an edit wants to set.
///
/// Unset fields are left untouched on the target voxel. This is also the
/// on-disk representation of structure voxels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shades: Option<[u8; 6]>,
}

impl VoxelEdit {
    /// A solid voxel of the given material.
    pub fn solid(material: Material) -> Self {
        Self {
            material: Some(material),
            solid: Some(true),
            ..Self::default()
        }
    }

    /// Clears solidity and nothing else.
    pub fn air() -> Self {
        Self {
            solid: Some(false),
            ..Self::default()
        }
    }

    /// Returns `self` with every field set in `other` replaced by `other`'s value.
    pub fn overridden_by(&self, other: &VoxelEdit) -> VoxelEdit {
        VoxelEdit {
            material: other.material.or(self.material),
            solid: other.solid.or(self.solid),
            reserved: other.reserved.or(self.reserved),
            shades: other.shades.or(self.shades),
        }
    }

    /// Lowers this edit into a byte-level write.
    pub fn to_write(&self) -> VoxelWrite {
        let mut write = VoxelWrite::default();
        if let Some(material) = self.material {
            write.fields[0] = Some(material.index());
        }
        if let Some(shades) = self.shades {
            for (i, shade) in shades.into_iter().enumerate() {
                write.fields[PARAMS_UNLIT + i] = Some(shade);
            }
        }
        match self.solid {
            Some(true) => write.flags_add |= FLAG_SOLID,
            Some(false) => write.flags_remove |= FLAG_SOLID,
            None => {}
        }
        match self.reserved {
            Some(true) => write.flags_add |= FLAG_RESERVED,
            Some(false) => write.flags_remove |= FLAG_RESERVED,
            None => {}
        }
        write
    }
}
