//! Floating-island density terms.
//!
//! An island is an ellipsoid of positive density: `1` at its centre, `0` on
//! its surface, negative outside. Weighted island terms are added on top of
//! the base terrain density.

use glam::DVec3;

/// Ellipsoid density around `centre`, horizontally `radius` and vertically
/// `height` in half-extent.
pub fn island_density(position: DVec3, centre: DVec3, radius: f64, height: f64) -> f64 {
    let d = position - centre;
    let r2 = radius * radius;
    1.0 - (d.x * d.x / r2 + d.y * d.y / r2 + d.z * d.z / (height * height))
}

/// A weighted island placed in the density field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Island {
    pub centre: DVec3,
    pub radius: f64,
    pub height: f64,
    /// Multiplier on the raw ellipsoid term.
    pub weight: f64,
}

impl Island {
    /// Weighted density contribution at `position`.
    pub fn density(&self, position: DVec3) -> f64 {
        island_density(position, self.centre, self.radius, self.height) * self.weight
    }
}
