//! Chunk keys and world ⇄ chunk coordinate conversion.
//!
//! World voxel positions are [`I64Vec3`]. The chunk containing a position is
//! found by floor division, the offset inside it by Euclidean modulo, so
//! negative coordinates map the same way as positive ones.

use std::fmt;
use std::str::FromStr;

use glam::{DVec3, I64Vec3};

use crate::chunk::CHUNK_SIZE;

const SIZE: i64 = CHUNK_SIZE as i64;

/// Position of a voxel inside its chunk; each component is in `0..CHUNK_SIZE`.
pub type LocalPos = [usize; 3];

/// Errors from parsing the canonical `"x,y,z"` key form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    /// The string did not contain exactly three comma-separated parts.
    #[error("expected three comma-separated components, got {0}")]
    WrongArity(usize),
    /// A component was not a base-10 integer.
    #[error("invalid key component {0:?}")]
    InvalidComponent(String),
    /// A component names a chunk outside the `i64` world.
    #[error("key component {0} is outside the addressable chunk range")]
    OutOfRange(i64),
}

/// Smallest key component whose chunk lies inside the `i64` world.
pub const MIN_KEY_COMPONENT: i64 = i64::MIN / SIZE;

/// Largest key component whose chunk lies inside the `i64` world.
pub const MAX_KEY_COMPONENT: i64 = i64::MAX / SIZE;

/// Identifies a chunk's position in chunk space.
///
/// Components of keys that address real voxels lie in
/// [`MIN_KEY_COMPONENT`]`..=`[`MAX_KEY_COMPONENT`]. Keys built by
/// [`position_to_chunk_key`] or parsed from a string always do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl ChunkKey {
    /// Creates a new chunk key.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Returns the key offset by `(dx, dy, dz)` chunks.
    pub fn offset(self, dx: i64, dy: i64, dz: i64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Whether every component is inside the addressable key range.
    pub fn in_range(self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|c| (MIN_KEY_COMPONENT..=MAX_KEY_COMPONENT).contains(c))
    }

    /// World position of this chunk's `(0, 0, 0)` voxel. Saturates for keys
    /// outside the addressable range.
    pub fn origin(self) -> I64Vec3 {
        I64Vec3::new(
            self.x.saturating_mul(SIZE),
            self.y.saturating_mul(SIZE),
            self.z.saturating_mul(SIZE),
        )
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for ChunkKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y, z] = parse_triple(s)?;
        if let Some(&c) = [x, y, z]
            .iter()
            .find(|c| !(MIN_KEY_COMPONENT..=MAX_KEY_COMPONENT).contains(*c))
        {
            return Err(KeyParseError::OutOfRange(c));
        }
        Ok(Self::new(x, y, z))
    }
}

/// Parses `"x,y,z"` into three integers.
pub(crate) fn parse_triple(s: &str) -> Result<[i64; 3], KeyParseError> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(KeyParseError::WrongArity(parts.len()));
    }
    let mut out = [0i64; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| KeyParseError::InvalidComponent((*part).to_string()))?;
    }
    Ok(out)
}

/// Chunk containing a world voxel position.
pub fn position_to_chunk_key(position: I64Vec3) -> ChunkKey {
    ChunkKey::new(
        position.x.div_euclid(SIZE),
        position.y.div_euclid(SIZE),
        position.z.div_euclid(SIZE),
    )
}

/// Offset of a world voxel position inside its chunk.
pub fn position_to_local(position: I64Vec3) -> LocalPos {
    [
        position.x.rem_euclid(SIZE) as usize,
        position.y.rem_euclid(SIZE) as usize,
        position.z.rem_euclid(SIZE) as usize,
    ]
}

/// Inverse of [`position_to_chunk_key`] + [`position_to_local`].
pub fn world_position(key: ChunkKey, local: LocalPos) -> I64Vec3 {
    key.origin() + I64Vec3::new(local[0] as i64, local[1] as i64, local[2] as i64)
}

/// Linear buffer index of a local position: `x + y*S + z*S*S`.
pub fn local_to_index(local: LocalPos) -> usize {
    debug_assert!(local.iter().all(|&c| c < CHUNK_SIZE));
    local[0] + local[1] * CHUNK_SIZE + local[2] * CHUNK_SIZE * CHUNK_SIZE
}

/// Inverse of [`local_to_index`].
pub fn index_to_local(index: usize) -> LocalPos {
    [
        index % CHUNK_SIZE,
        (index / CHUNK_SIZE) % CHUNK_SIZE,
        index / (CHUNK_SIZE * CHUNK_SIZE),
    ]
}

/// The voxel containing a continuous position.
///
/// Voxel centres sit on integer coordinates. Exact half-way points resolve
/// to the lower voxel.
pub fn snap_to_voxel(position: DVec3) -> I64Vec3 {
    I64Vec3::new(
        snap_component(position.x),
        snap_component(position.y),
        snap_component(position.z),
    )
}

fn snap_component(value: f64) -> i64 {
    (value - 0.5).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for key in [
            ChunkKey::new(0, 0, 0),
            ChunkKey::new(-1, 2, -3),
            ChunkKey::new(MAX_KEY_COMPONENT, MIN_KEY_COMPONENT, 17),
        ] {
            let parsed: ChunkKey = key.to_string().parse().unwrap();
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_key_canonical_form() {
        assert_eq!(ChunkKey::new(1, -2, 3).to_string(), "1,-2,3");
    }

    #[test]
    fn test_malformed_keys_rejected() {
        assert_eq!(
            "1,2".parse::<ChunkKey>(),
            Err(KeyParseError::WrongArity(2))
        );
        assert!(matches!(
            "1,b,3".parse::<ChunkKey>(),
            Err(KeyParseError::InvalidComponent(_))
        ));
    }

    #[test]
    fn test_out_of_range_keys_rejected() {
        let key = ChunkKey::new(i64::MAX, 0, 0);
        assert!(!key.in_range());
        assert_eq!(
            key.to_string().parse::<ChunkKey>(),
            Err(KeyParseError::OutOfRange(i64::MAX))
        );
        assert_eq!(
            format!("0,{},0", MIN_KEY_COMPONENT - 1).parse::<ChunkKey>(),
            Err(KeyParseError::OutOfRange(MIN_KEY_COMPONENT - 1))
        );
        assert_eq!(key.origin().x, i64::MAX);
    }

    #[test]
    fn test_extreme_keys_cover_extreme_positions() {
        let max = I64Vec3::splat(i64::MAX);
        let min = I64Vec3::splat(i64::MIN);
        for p in [max, min] {
            let key = position_to_chunk_key(p);
            assert!(key.in_range());
            assert_eq!(world_position(key, position_to_local(p)), p);
        }
        assert_eq!(position_to_chunk_key(max).x, MAX_KEY_COMPONENT);
        assert_eq!(position_to_chunk_key(min).x, MIN_KEY_COMPONENT);
    }

    #[test]
    fn test_negative_positions_use_floor() {
        let p = I64Vec3::new(-1, -32, -33);
        assert_eq!(position_to_chunk_key(p), ChunkKey::new(-1, -1, -2));
        assert_eq!(position_to_local(p), [31, 0, 31]);
    }

    #[test]
    fn test_local_in_range_and_reconstructs() {
        for x in -70..70 {
            for (y, z) in [(-65, 3), (0, -1), (31, 32), (100, -100)] {
                let p = I64Vec3::new(x, y, z);
                let key = position_to_chunk_key(p);
                let local = position_to_local(p);
                assert!(local.iter().all(|&c| c < CHUNK_SIZE));
                assert_eq!(world_position(key, local), p);
            }
        }
    }

    #[test]
    fn test_index_round_trip() {
        for index in [0, 1, 31, 32, 1024, 32767] {
            assert_eq!(local_to_index(index_to_local(index)), index);
        }
        assert_eq!(local_to_index([1, 2, 3]), 1 + 2 * 32 + 3 * 1024);
    }

    #[test]
    fn test_snap_to_voxel() {
        assert_eq!(snap_to_voxel(DVec3::new(0.5, 0.49, 0.51)), I64Vec3::new(0, 0, 1));
        assert_eq!(snap_to_voxel(DVec3::new(-0.5, -0.51, 9.4999)), I64Vec3::new(-1, -1, 9));
    }
}
