//! Layered Perlin density field.
//!
//! Three octaves of 3D noise are blended by a very low-frequency 2D
//! "steepness" map: flat regions get gentle rolling hills, steep regions get
//! tall cliffs and overhangs. A linear falloff in `z` keeps the ground near
//! `z = 4`. A position is solid where the density is positive.

use glam::DVec3;
use noise::{NoiseFn, Perlin};

use crate::island::Island;

/// Shape parameters of the density field.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityParams {
    /// Horizontal feature size of the mid octave, in voxels.
    pub scale: f64,
    /// Vertical squash of the fine and mid octaves.
    pub z_scale: f64,
    /// Voxels of height per unit of falloff density.
    pub height_scale: f64,
    /// Extra island terms added to the field.
    pub islands: Vec<Island>,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            scale: 20.0,
            z_scale: 0.5,
            height_scale: 14.0,
            islands: Vec::new(),
        }
    }
}

fn map_clamped(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let t = ((value - in_min) / (in_max - in_min)).clamp(0.0, 1.0);
    out_min + t * (out_max - out_min)
}

/// A seeded density field.
#[derive(Clone, Debug)]
pub struct DensityField {
    noise: Perlin,
    params: DensityParams,
}

impl DensityField {
    /// Create a field from a noise seed (see [`crate::seed::noise_seed`]).
    pub fn new(seed: u32, params: DensityParams) -> Self {
        Self {
            noise: Perlin::new(seed),
            params,
        }
    }

    /// Returns the field parameters.
    pub fn params(&self) -> &DensityParams {
        &self.params
    }

    /// Density at a world position.
    pub fn density(&self, position: DVec3) -> f64 {
        let DVec3 { x, y, z } = position;
        let p = &self.params;
        let s = p.scale;

        let steepness = self.noise.get([x / (s * 50.0), y / (s * 50.0)]);
        let coarse_amp = map_clamped(steepness, 0.0, 0.9, 0.7, 15.0);
        let mid_amp = map_clamped(steepness, 0.0, 0.9, 0.1, 1.5);
        let fine_amp = map_clamped(steepness, 0.0, 0.9, 0.3, 1.1);

        let fine = s / 4.0;
        let coarse = s * 6.0;
        let mut density = self.noise.get([x / fine, y / fine, z / (fine * p.z_scale)]) * 0.06 * fine_amp;
        density += self.noise.get([x / s, y / s, z / (s * p.z_scale)]) * mid_amp;
        density += self.noise.get([x / coarse, y / coarse, z / (coarse * 1.2)]) * coarse_amp;
        density += (4.0 - z) / p.height_scale;
        density -= 0.2;

        for island in &p.islands {
            density += island.density(position);
        }
        density
    }

    /// Whether the voxel at `position` is solid.
    pub fn is_solid(&self, position: DVec3) -> bool {
        self.density(position) > 0.0
    }
}
