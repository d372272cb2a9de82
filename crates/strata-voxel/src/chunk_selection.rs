//! Chunk selection around a viewpoint.
//!
//! Walks a square spiral outward from the viewpoint's chunk column so that
//! both output lists come out nearest-first. Chunks inside the load radius
//! (and the load band vertically) should be generated; chunks inside the
//! wider keep radius may stay resident but are not loaded on their own.

use glam::DVec3;
use rustc_hash::FxHashSet;

use crate::chunk::CHUNK_SIZE;
use crate::coords::ChunkKey;

/// Radii for chunk selection, in chunk units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkSelectConfig {
    /// Horizontal radius of the load set.
    pub load_distance: u32,
    /// Extra horizontal and vertical band kept resident beyond the load set.
    pub keep_margin: u32,
}

impl Default for ChunkSelectConfig {
    fn default() -> Self {
        Self {
            load_distance: 5,
            keep_margin: 2,
        }
    }
}

impl ChunkSelectConfig {
    /// Vertical radius of the load set: `floor(min(L, 2 + L/4))`.
    pub fn load_distance_vertical(&self) -> i64 {
        let l = self.load_distance as f64;
        l.min(2.0 + l / 4.0).floor() as i64
    }

    /// Vertical radius of the keep set.
    pub fn keep_distance_vertical(&self) -> i64 {
        self.load_distance_vertical() + 2
    }
}

/// Output of [`select_chunks`].
#[derive(Clone, Debug, Default)]
pub struct ChunkSelection {
    /// Keys to generate, nearest first.
    pub to_load: Vec<ChunkKey>,
    /// Keys allowed to stay resident without being in the load set.
    pub to_keep: Vec<ChunkKey>,
    load_set: FxHashSet<ChunkKey>,
    keep_set: FxHashSet<ChunkKey>,
}

impl ChunkSelection {
    fn push_load(&mut self, key: ChunkKey) {
        if self.load_set.insert(key) {
            self.to_load.push(key);
        }
    }

    fn push_keep(&mut self, key: ChunkKey) {
        if self.keep_set.insert(key) {
            self.to_keep.push(key);
        }
    }

    /// Whether `key` is in the load set.
    pub fn contains_load(&self, key: ChunkKey) -> bool {
        self.load_set.contains(&key)
    }

    /// Whether `key` is in the keep set.
    pub fn contains_keep(&self, key: ChunkKey) -> bool {
        self.keep_set.contains(&key)
    }

    /// Whether a resident chunk at `key` should survive this selection.
    pub fn is_retained(&self, key: ChunkKey) -> bool {
        self.contains_load(key) || self.contains_keep(key)
    }
}

/// Chunk containing a continuous viewpoint.
pub fn viewpoint_chunk(viewpoint: DVec3) -> ChunkKey {
    let size = CHUNK_SIZE as f64;
    ChunkKey::new(
        (viewpoint.x / size).floor() as i64,
        (viewpoint.y / size).floor() as i64,
        (viewpoint.z / size).floor() as i64,
    )
}

/// Computes the load and keep sets around `viewpoint`.
pub fn select_chunks(viewpoint: DVec3, config: &ChunkSelectConfig) -> ChunkSelection {
    let load = config.load_distance as i64;
    let keep = load + config.keep_margin as i64;
    let r2 = (load as f64 + 0.5).powi(2);
    let k2 = (keep as f64 + 0.5).powi(2);
    let load_vertical = config.load_distance_vertical();
    let keep_vertical = config.keep_distance_vertical();
    let centre = viewpoint_chunk(viewpoint);

    let mut selection = ChunkSelection::default();
    let (mut dx, mut dy) = (0i64, 0i64);
    let turns = keep * 4 + 1;

    for turn in 0..turns {
        let steps = turn / 2 + 1;
        for _ in 0..steps {
            let d = (dx * dx + dy * dy) as f64;
            let column = centre.offset(dx, dy, 0);
            if d <= r2 {
                selection.push_load(column);
                for z in 1..=keep_vertical {
                    if z <= load_vertical {
                        selection.push_load(column.offset(0, 0, -z));
                        selection.push_load(column.offset(0, 0, z));
                    } else {
                        selection.push_keep(column.offset(0, 0, -z));
                        selection.push_keep(column.offset(0, 0, z));
                    }
                }
            } else if d <= k2 {
                selection.push_keep(column);
                for z in 1..=keep_vertical {
                    selection.push_keep(column.offset(0, 0, -z));
                    selection.push_keep(column.offset(0, 0, z));
                }
            }

            match turn % 4 {
                0 => dx += 1,
                1 => dy += 1,
                2 => dx -= 1,
                _ => dy -= 1,
            }
        }
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(load_distance: u32) -> ChunkSelectConfig {
        ChunkSelectConfig {
            load_distance,
            keep_margin: 2,
        }
    }

    #[test]
    fn test_vertical_distances() {
        assert_eq!(config(1).load_distance_vertical(), 1);
        assert_eq!(config(5).load_distance_vertical(), 3);
        assert_eq!(config(5).keep_distance_vertical(), 5);
        assert_eq!(config(0).load_distance_vertical(), 0);
    }

    #[test]
    fn test_load_distance_one_is_three_by_three() {
        let selection = select_chunks(DVec3::new(1.0, 1.0, 1.0), &config(1));
        assert_eq!(selection.to_load[0], ChunkKey::new(0, 0, 0));

        let mut columns: Vec<(i64, i64)> = selection.to_load.iter().map(|k| (k.x, k.y)).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), 9);
        assert!(columns.iter().all(|(x, y)| x.abs() <= 1 && y.abs() <= 1));
        assert_eq!(selection.to_load.len(), 27);
        assert!(selection.to_load.iter().all(|k| k.z.abs() <= 1));
    }

    #[test]
    fn test_origin_column_comes_first() {
        let selection = select_chunks(DVec3::ZERO, &config(2));
        assert_eq!(
            &selection.to_load[..5],
            &[
                ChunkKey::new(0, 0, 0),
                ChunkKey::new(0, 0, -1),
                ChunkKey::new(0, 0, 1),
                ChunkKey::new(0, 0, -2),
                ChunkKey::new(0, 0, 2),
            ]
        );
    }

    #[test]
    fn test_nearest_first() {
        let selection = select_chunks(DVec3::ZERO, &config(4));
        let rings: Vec<i64> = selection
            .to_load
            .iter()
            .filter(|k| k.z == 0)
            .map(|k| k.x.abs().max(k.y.abs()))
            .collect();
        assert!(rings[..9].iter().all(|&r| r <= 1));
        assert!(rings[9..25].iter().all(|&r| r == 2));
    }

    #[test]
    fn test_sets_are_disjoint_and_queryable() {
        let selection = select_chunks(DVec3::new(-40.0, 70.0, 5.0), &config(3));
        let centre = ChunkKey::new(-2, 2, 0);
        assert!(selection.contains_load(centre));
        for key in &selection.to_keep {
            assert!(!selection.contains_load(*key));
            assert!(selection.is_retained(*key));
        }
        // Beyond the load band vertically but inside the keep band.
        assert!(selection.contains_keep(centre.offset(0, 0, 4)));
        // Outside the load radius horizontally.
        assert!(selection.contains_keep(centre.offset(4, 0, 0)));
        assert!(!selection.is_retained(centre.offset(10, 0, 0)));
    }

    #[test]
    fn test_viewpoint_chunk_floors_negative() {
        assert_eq!(viewpoint_chunk(DVec3::new(-0.1, 31.9, 32.0)), ChunkKey::new(-1, 0, 1));
    }
}
