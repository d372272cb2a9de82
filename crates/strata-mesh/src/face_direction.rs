//! The six cardinal directions a voxel face can point, in the Z-up world.

/// One of the six cardinal directions a voxel face can point.
///
/// The `repr(u8)` discriminant is the index of the face's shade byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceDirection {
    /// −X direction.
    West = 0,
    /// −Y direction.
    North = 1,
    /// −Z direction.
    Down = 2,
    /// +X direction.
    East = 3,
    /// +Y direction.
    South = 4,
    /// +Z direction.
    Up = 5,
}

impl FaceDirection {
    /// All six directions in shade-index order.
    pub const ALL: [FaceDirection; 6] = [
        Self::West,
        Self::North,
        Self::Down,
        Self::East,
        Self::South,
        Self::Up,
    ];

    /// Order in which faces are merged.
    pub const MERGE_ORDER: [FaceDirection; 6] = [
        Self::East,
        Self::South,
        Self::Down,
        Self::West,
        Self::North,
        Self::Up,
    ];

    /// Order in which merged quads are written to the vertex buffer.
    pub const EMIT_ORDER: [FaceDirection; 6] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Up,
        Self::Down,
    ];

    /// Decodes a shade index. Returns `None` if out of range.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Axis perpendicular to the face: 0=X, 1=Y, 2=Z.
    pub fn axis(self) -> usize {
        self.index() % 3
    }

    /// True for the −X, −Y and −Z faces, whose winding is reversed on emission.
    pub fn is_negative(self) -> bool {
        self.index() < 3
    }

    /// Returns the unit normal as `[f32; 3]`.
    pub fn normal(self) -> [f32; 3] {
        let mut n = [0.0; 3];
        n[self.axis()] = if self.is_negative() { -1.0 } else { 1.0 };
        n
    }

    /// Returns the neighbor coordinate offset for this direction.
    pub fn offset(self, x: i32, y: i32, z: i32) -> (i32, i32, i32) {
        match self {
            Self::West => (x - 1, y, z),
            Self::North => (x, y - 1, z),
            Self::Down => (x, y, z - 1),
            Self::East => (x + 1, y, z),
            Self::South => (x, y + 1, z),
            Self::Up => (x, y, z + 1),
        }
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 3) % 6]
    }

    /// Returns the direction index (0–5), equal to the shade index.
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_directions_unique() {
        for (i, a) in FaceDirection::ALL.iter().enumerate() {
            for (j, b) in FaceDirection::ALL.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_offset_east() {
        assert_eq!(FaceDirection::East.offset(5, 10, 15), (6, 10, 15));
        assert_eq!(FaceDirection::Down.offset(5, 10, 15), (5, 10, 14));
    }

    #[test]
    fn test_opposite_round_trip() {
        for dir in FaceDirection::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.opposite().axis(), dir.axis());
        }
    }

    #[test]
    fn test_normals() {
        assert_eq!(FaceDirection::North.normal(), [0.0, -1.0, 0.0]);
        assert_eq!(FaceDirection::Up.normal(), [0.0, 0.0, 1.0]);
        assert_eq!(FaceDirection::West.normal(), [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_u8() {
        assert_eq!(FaceDirection::from_u8(4), Some(FaceDirection::South));
        assert_eq!(FaceDirection::from_u8(6), None);
    }
}
