//! Unplaced, position-relative voxel patches and the operations that place,
//! combine, and transform them.
//!
//! A [`Structure`] is sparse: only the positions it mentions are written when
//! it is merged, and only the fields each entry sets are overwritten. Asset
//! files are JSON with `"x,y,z"` string keys for the voxel map.

use std::collections::BTreeMap;

use glam::I64Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::coords::parse_triple;
use crate::store::ChunkStore;
use crate::voxel::VoxelEdit;

/// Errors raised while loading a structure asset.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    /// The asset was not valid structure JSON.
    #[error("structure JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cardinal direction in the Z-up world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// -X
    West,
    /// -Y
    North,
    /// -Z
    Down,
    /// +X
    East,
    /// +Y
    South,
    /// +Z
    Up,
}

impl Direction {
    /// Every direction in face-index order.
    pub const ALL: [Direction; 6] = [
        Self::West,
        Self::North,
        Self::Down,
        Self::East,
        Self::South,
        Self::Up,
    ];

    /// Face index shared with voxel shade bytes and structure connections.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit vector pointing this way.
    pub fn vector(self) -> I64Vec3 {
        match self {
            Self::West => I64Vec3::NEG_X,
            Self::North => I64Vec3::NEG_Y,
            Self::Down => I64Vec3::NEG_Z,
            Self::East => I64Vec3::X,
            Self::South => I64Vec3::Y,
            Self::Up => I64Vec3::Z,
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 3) % 6]
    }
}

/// A named marker embedded in a structure (spawn points, pickups).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    pub name: String,
    pub position: I64Vec3,
}

/// An opening other generators may attach rooms to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doorway {
    pub position: I64Vec3,
    pub direction: Direction,
}

/// Face connection descriptor used by constraint-based generators.
///
/// An empty `kind` connects to anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetry: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Connection {
    /// Whether two facing connections may sit next to each other.
    ///
    /// Kinds must agree, plug modes (when both present) must differ, and the
    /// shared prefix of the symmetry lists must be identical.
    pub fn matches(&self, other: &Connection) -> bool {
        if self.kind.is_empty() || other.kind.is_empty() {
            return true;
        }
        if self.kind != other.kind {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.mode, &other.mode)
            && a == b
        {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.symmetry, &other.symmetry) {
            return a.iter().zip(b).all(|(x, y)| x == y);
        }
        true
    }

    fn swap_symmetry(&mut self, i: usize, j: usize) {
        if let Some(symmetry) = &mut self.symmetry
            && i < symmetry.len()
            && j < symmetry.len()
        {
            symmetry.swap(i, j);
        }
    }

    /// Rotates the first four symmetry entries one step (`s[0] ← s[1] ← …`).
    fn cycle_symmetry(&mut self, forward: bool) {
        if let Some(symmetry) = &mut self.symmetry
            && symmetry.len() >= 4
        {
            if forward {
                symmetry[..4].rotate_left(1);
            } else {
                symmetry[..4].rotate_right(1);
            }
        }
    }
}

/// Coordinate axis selector for transforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One step of a structure transformation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    /// Moves every position by `offset`.
    Translate(I64Vec3),
    /// Reflects across the plane through `origin` perpendicular to `axis`.
    Mirror { axis: Axis, origin: I64Vec3 },
    /// Rotates by `amount` quarter turns about `axis` through `origin`.
    Rotate { axis: Axis, amount: u8, origin: I64Vec3 },
}

/// Sparse voxel patch plus generator metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Structure {
    #[serde(with = "voxel_map")]
    pub voxels: FxHashMap<I64Vec3, VoxelEdit>,
    pub things: Vec<Thing>,
    pub doorways: Vec<Doorway>,
    /// Indexed like [`Direction::index`].
    pub connections: [Connection; 6],
    pub weight: f64,
    pub asset_name: String,
}

impl Default for Structure {
    fn default() -> Self {
        Self {
            voxels: FxHashMap::default(),
            things: Vec::new(),
            doorways: Vec::new(),
            connections: Default::default(),
            weight: 0.0,
            asset_name: "UNNAMED".to_string(),
        }
    }
}

impl Structure {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a structure asset.
    pub fn from_json(json: &str) -> Result<Self, StructureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes this structure to asset JSON.
    pub fn to_json(&self) -> Result<String, StructureError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Sets the voxel at a local position.
    pub fn set(&mut self, position: I64Vec3, voxel: VoxelEdit) {
        self.voxels.insert(position, voxel);
    }

    /// Whether the entry at `position` is explicitly solid.
    pub fn is_solid(&self, position: I64Vec3) -> bool {
        self.voxels
            .get(&position)
            .and_then(|voxel| voxel.solid)
            .unwrap_or(false)
    }

    /// Writes every entry into `store` at `position + local`.
    ///
    /// Fields set in `global_override` take precedence over the entry's own.
    /// Entries that land in absent chunks are dropped.
    pub fn merge_into_world<M>(
        &self,
        store: &mut ChunkStore<M>,
        position: I64Vec3,
        global_override: Option<&VoxelEdit>,
    ) {
        for (local, voxel) in &self.voxels {
            let edit = match global_override {
                Some(over) => voxel.overridden_by(over),
                None => *voxel,
            };
            store.edit_voxel(position + *local, &edit);
        }
    }

    /// Copies `other`, translated by `position`, into this structure.
    ///
    /// Overlapping voxels take `other`'s value; things and doorways are appended.
    pub fn merge_structure(&mut self, other: &Structure, position: I64Vec3) {
        let moved = other.transformed(&[Transform::Translate(position)]);
        self.voxels.extend(moved.voxels);
        self.things.extend(moved.things);
        self.doorways.extend(moved.doorways);
    }

    /// Whether any voxel this structure would occupy at `position` is reserved
    /// in the world.
    pub fn check_reserved_in_world<M>(&self, store: &ChunkStore<M>, position: I64Vec3) -> bool {
        self.voxels
            .keys()
            .any(|local| store.is_reserved(position + *local))
    }

    /// Whether any voxel this structure would occupy at `position` is marked
    /// reserved inside `main`.
    pub fn check_reserved_in_structure(&self, main: &Structure, position: I64Vec3) -> bool {
        self.voxels.keys().any(|local| {
            main.voxels
                .get(&(position + *local))
                .is_some_and(|voxel| voxel.reserved == Some(true))
        })
    }

    /// Returns a transformed copy. Connections follow mirror and Z-axis
    /// rotation; the asset name gains a `TRANSFORMED` suffix.
    pub fn transformed(&self, transforms: &[Transform]) -> Structure {
        Structure {
            voxels: self
                .voxels
                .iter()
                .map(|(pos, voxel)| (transform_position(*pos, transforms), *voxel))
                .collect(),
            things: self
                .things
                .iter()
                .map(|thing| Thing {
                    name: thing.name.clone(),
                    position: transform_position(thing.position, transforms),
                })
                .collect(),
            doorways: self
                .doorways
                .iter()
                .map(|doorway| Doorway {
                    position: transform_position(doorway.position, transforms),
                    direction: doorway.direction,
                })
                .collect(),
            connections: transform_connections(&self.connections, transforms),
            weight: self.weight,
            asset_name: format!("{}TRANSFORMED", self.asset_name),
        }
    }
}

/// Applies a transform chain to a single position.
pub fn transform_position(position: I64Vec3, transforms: &[Transform]) -> I64Vec3 {
    let mut p = position.to_array();
    for transform in transforms {
        match *transform {
            Transform::Translate(offset) => {
                p = (I64Vec3::from_array(p) + offset).to_array();
            }
            Transform::Mirror { axis, origin } => {
                let i = axis_index(axis);
                let o = origin.to_array();
                p[i] = o[i] - (p[i] - o[i]);
            }
            Transform::Rotate {
                axis,
                amount,
                origin,
            } => {
                let (a, b) = rotation_plane(axis);
                let o = origin.to_array();
                let (da, db) = (p[a] - o[a], p[b] - o[b]);
                let (na, nb) = match amount % 4 {
                    1 => (db, -da),
                    2 => (-da, -db),
                    3 => (-db, da),
                    _ => (da, db),
                };
                p[a] = o[a] + na;
                p[b] = o[b] + nb;
            }
        }
    }
    I64Vec3::from_array(p)
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
        Axis::Z => 2,
    }
}

fn rotation_plane(axis: Axis) -> (usize, usize) {
    match axis {
        Axis::X => (1, 2),
        Axis::Y => (0, 2),
        Axis::Z => (0, 1),
    }
}

/// Permutes face connections to follow a transform chain.
///
/// Only mirrors and rotations about Z move connections.
pub fn transform_connections(
    connections: &[Connection; 6],
    transforms: &[Transform],
) -> [Connection; 6] {
    const W: usize = 0;
    const N: usize = 1;
    const D: usize = 2;
    const E: usize = 3;
    const S: usize = 4;
    const U: usize = 5;

    let mut c = connections.clone();
    for transform in transforms {
        match *transform {
            Transform::Translate(_) => {}
            Transform::Mirror { axis: Axis::X, .. } => {
                c.swap(W, E);
                c[N].swap_symmetry(0, 1);
                c[S].swap_symmetry(0, 1);
                c[D].swap_symmetry(0, 2);
                c[U].swap_symmetry(0, 2);
            }
            Transform::Mirror { axis: Axis::Y, .. } => {
                c.swap(N, S);
                c[W].swap_symmetry(0, 1);
                c[E].swap_symmetry(0, 1);
                c[D].swap_symmetry(1, 3);
                c[U].swap_symmetry(1, 3);
            }
            Transform::Mirror { axis: Axis::Z, .. } => {
                c.swap(D, U);
            }
            Transform::Rotate {
                axis: Axis::Z,
                amount,
                ..
            } => match amount % 4 {
                1 => {
                    let west = std::mem::take(&mut c[W]);
                    c[W] = std::mem::take(&mut c[N]);
                    c[N] = std::mem::take(&mut c[E]);
                    c[E] = std::mem::take(&mut c[S]);
                    c[S] = west;
                    c[D].cycle_symmetry(true);
                    c[U].cycle_symmetry(true);
                    c[N].swap_symmetry(0, 1);
                    c[S].swap_symmetry(0, 1);
                }
                2 => {
                    c.swap(W, E);
                    c.swap(N, S);
                    for face in [D, U] {
                        c[face].swap_symmetry(0, 2);
                        c[face].swap_symmetry(1, 3);
                    }
                    for face in [W, N, E, S] {
                        c[face].swap_symmetry(0, 1);
                    }
                }
                3 => {
                    let south = std::mem::take(&mut c[S]);
                    c[S] = std::mem::take(&mut c[E]);
                    c[E] = std::mem::take(&mut c[N]);
                    c[N] = std::mem::take(&mut c[W]);
                    c[W] = south;
                    c[D].cycle_symmetry(false);
                    c[U].cycle_symmetry(false);
                    c[W].swap_symmetry(0, 1);
                    c[E].swap_symmetry(0, 1);
                }
                _ => {}
            },
            Transform::Rotate { .. } => {}
        }
    }
    c
}

/// Serde adapter for the voxel map: `"x,y,z"` string keys on disk.
mod voxel_map {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &FxHashMap<I64Vec3, VoxelEdit>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, &VoxelEdit> = map
            .iter()
            .map(|(p, v)| (format!("{},{},{}", p.x, p.y, p.z), v))
            .collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<FxHashMap<I64Vec3, VoxelEdit>, D::Error> {
        let keyed = BTreeMap::<String, VoxelEdit>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(key, voxel)| {
                parse_triple(&key)
                    .map(|p| (I64Vec3::from_array(p), voxel))
                    .map_err(D::Error::custom)
            })
            .collect()
    }
}
