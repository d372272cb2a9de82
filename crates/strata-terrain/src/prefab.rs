//! Simple structure builders and structure selection.

use glam::I64Vec3;
use rand::Rng;
use strata_voxel::{CHUNK_SIZE, Material, Structure, VoxelEdit};

/// Height of the spawn platform in voxels.
pub const SPAWN_PLATFORM_HEIGHT: i64 = 7;

/// A solid box of `voxel`, from the origin to `(width, length, height)` exclusive.
pub fn rectangular_prism(voxel: VoxelEdit, width: i64, length: i64, height: i64) -> Structure {
    let mut ret = Structure::new();
    for x in 0..width {
        for y in 0..length {
            for z in 0..height {
                ret.set(I64Vec3::new(x, y, z), voxel);
            }
        }
    }
    ret
}

/// Dimensions of a hollow room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomParams {
    pub width: i64,
    pub length: i64,
    pub height: i64,
    pub wall_thickness: i64,
    pub floor_thickness: i64,
    pub ceiling_thickness: i64,
}

impl Default for RoomParams {
    fn default() -> Self {
        Self {
            width: 1,
            length: 1,
            height: 1,
            wall_thickness: 1,
            floor_thickness: 2,
            ceiling_thickness: 1,
        }
    }
}

/// A hollow box: floor, ceiling, and four walls of `voxel`. The interior is
/// left unset, so merging a room does not clear what is already inside.
pub fn room(voxel: VoxelEdit, params: &RoomParams) -> Structure {
    let RoomParams {
        width,
        length,
        height,
        wall_thickness: wall,
        floor_thickness: floor,
        ceiling_thickness: ceiling,
    } = *params;

    let mut ret = Structure::new();
    let mut fill = |xs: std::ops::Range<i64>, ys: std::ops::Range<i64>, zs: std::ops::Range<i64>| {
        for x in xs {
            for y in ys.clone() {
                for z in zs.clone() {
                    ret.set(I64Vec3::new(x, y, z), voxel);
                }
            }
        }
    };

    let walls_z = floor..height - ceiling;
    // Ceiling and floor.
    fill(0..width, 0..length, (height - ceiling).max(0)..height);
    fill(0..width, 0..length, 0..floor.min(height));
    // Walls spanning the full width.
    fill(0..width, (length - wall).max(0)..length, walls_z.clone());
    fill(0..width, 0..wall.min(length), walls_z.clone());
    // Walls between them.
    fill((width - wall).max(0)..width, wall..length - wall, walls_z.clone());
    fill(0..wall.min(width), wall..length - wall, walls_z);
    ret
}

/// Voxel patterns for [`apply_pattern`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Every voxel becomes the first voxel.
    Flat,
    /// Alternates by the parity of `x + y + z`.
    Checker,
}

impl Pattern {
    fn picks_second(self, position: I64Vec3) -> bool {
        match self {
            Self::Flat => false,
            Self::Checker => (position.x + position.y + position.z) % 2 != 0,
        }
    }
}

/// Repaints a structure with a pattern.
///
/// With a `material_mask`, only voxels whose material equals the mask are
/// repainted.
pub fn apply_pattern(
    structure: &Structure,
    pattern: Pattern,
    voxel1: VoxelEdit,
    voxel2: VoxelEdit,
    material_mask: Option<Material>,
) -> Structure {
    let mut ret = structure.clone();
    for (position, voxel) in ret.voxels.iter_mut() {
        if material_mask.is_none() || voxel.material == material_mask {
            *voxel = if pattern.picks_second(*position) {
                voxel2
            } else {
                voxel1
            };
        }
    }
    ret
}

/// Picks a structure at random with probability proportional to its weight.
///
/// Returns `None` for an empty list. Falls back to the first entry when the
/// weights do not cover the roll (e.g. all weights zero).
pub fn pick_weighted<'a, R: Rng + ?Sized>(list: &'a [Structure], rng: &mut R) -> Option<&'a Structure> {
    let first = list.first()?;
    let total: f64 = list.iter().map(|s| s.weight).sum();
    let mut selection = rng.random::<f64>() * total;
    for structure in list {
        selection -= structure.weight;
        if selection < 0.0 {
            return Some(structure);
        }
    }
    Some(first)
}

/// The chunk-wide checkerboard of dirt and grass the player spawns on.
pub fn spawn_platform() -> Structure {
    let size = CHUNK_SIZE as i64;
    let prism = rectangular_prism(VoxelEdit::solid(Material::Dirt), size, size, SPAWN_PLATFORM_HEIGHT);
    let mut platform = apply_pattern(
        &prism,
        Pattern::Checker,
        VoxelEdit::solid(Material::Dirt),
        VoxelEdit::solid(Material::Grass),
        None,
    );
    platform.asset_name = "spawnPlatform".to_string();
    platform
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn stone() -> VoxelEdit {
        VoxelEdit::solid(Material::Stone)
    }

    #[test]
    fn test_prism_volume() {
        let prism = rectangular_prism(stone(), 3, 4, 5);
        assert_eq!(prism.voxels.len(), 60);
        assert!(prism.is_solid(I64Vec3::new(2, 3, 4)));
        assert!(!prism.is_solid(I64Vec3::new(3, 0, 0)));
    }

    #[test]
    fn test_room_is_hollow() {
        let params = RoomParams {
            width: 5,
            length: 6,
            height: 7,
            ..RoomParams::default()
        };
        let r = room(stone(), &params);
        // Interior: x 1..4, y 1..5, z 2..6.
        assert!(!r.voxels.contains_key(&I64Vec3::new(2, 2, 3)));
        assert!(r.is_solid(I64Vec3::new(0, 2, 3)));
        assert!(r.is_solid(I64Vec3::new(4, 2, 3)));
        assert!(r.is_solid(I64Vec3::new(2, 0, 3)));
        assert!(r.is_solid(I64Vec3::new(2, 5, 3)));
        assert!(r.is_solid(I64Vec3::new(2, 2, 1)));
        assert!(r.is_solid(I64Vec3::new(2, 2, 6)));
        let total = 5 * 6 * 7;
        let interior = 3 * 4 * 4;
        assert_eq!(r.voxels.len(), total - interior);
    }

    #[test]
    fn test_checker_pattern() {
        let prism = rectangular_prism(stone(), 2, 2, 1);
        let dirt = VoxelEdit::solid(Material::Dirt);
        let grass = VoxelEdit::solid(Material::Grass);
        let checked = apply_pattern(&prism, Pattern::Checker, dirt, grass, None);
        assert_eq!(checked.voxels[&I64Vec3::new(0, 0, 0)], dirt);
        assert_eq!(checked.voxels[&I64Vec3::new(1, 0, 0)], grass);
        assert_eq!(checked.voxels[&I64Vec3::new(1, 1, 0)], dirt);
    }

    #[test]
    fn test_material_mask() {
        let mut s = rectangular_prism(stone(), 2, 1, 1);
        s.set(I64Vec3::new(0, 0, 0), VoxelEdit::solid(Material::Wood));
        let metal = VoxelEdit::solid(Material::Metal);
        let out = apply_pattern(&s, Pattern::Flat, metal, metal, Some(Material::Stone));
        assert_eq!(out.voxels[&I64Vec3::new(0, 0, 0)].material, Some(Material::Wood));
        assert_eq!(out.voxels[&I64Vec3::new(1, 0, 0)], metal);
    }

    #[test]
    fn test_pick_weighted() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert!(pick_weighted(&[], &mut rng).is_none());

        let mut heavy = Structure::new();
        heavy.weight = 1.0;
        heavy.asset_name = "heavy".into();
        let mut never = Structure::new();
        never.weight = 0.0;
        never.asset_name = "never".into();
        let list = [never, heavy];
        for _ in 0..100 {
            assert_eq!(pick_weighted(&list, &mut rng).unwrap().asset_name, "heavy");
        }
    }

    #[test]
    fn test_spawn_platform() {
        let p = spawn_platform();
        assert_eq!(p.voxels.len(), 32 * 32 * 7);
        assert_eq!(p.voxels[&I64Vec3::new(0, 0, 0)].material, Some(Material::Dirt));
        assert_eq!(p.voxels[&I64Vec3::new(0, 0, 1)].material, Some(Material::Grass));
    }
}
