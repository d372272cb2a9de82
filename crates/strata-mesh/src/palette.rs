//! Per-material color rows and their location in the color-map texture.
//!
//! Each material owns a row of colors running from near-black to its base
//! color. A face's shade byte picks a color from its material's row; the
//! color is then addressed in a 32×1024 color-map texture by its quantized
//! RGB components.

use std::sync::LazyLock;

use strata_voxel::Material;

/// An RGB color with components in `0..=1`.
pub type Rgb = [f32; 3];

/// Width of the color-map texture in texels (and quantization steps per channel).
pub const COLOR_MAP_WIDTH: u32 = 32;

/// Upper bound on colors generated per palette row.
pub const PALETTE_ROW_SIZE: u32 = 20;

/// Largest shade value.
pub const MAX_SHADE: u8 = 255;

/// `(h, s, v, h_range)` seeds for each material row.
const ROW_SEEDS: [(Material, [f64; 4]); 21] = [
    (Material::Structure, [0.027, 0.5, 0.8, 0.13]),
    (Material::Grass, [0.33, 0.48, 0.67, 0.05]),
    (Material::Leaves, [0.31, 0.65, 0.84, 0.1]),
    (Material::Vines, [0.35, 0.87, 0.89, 0.02]),
    (Material::Fruit, [0.03, 0.74, 0.83, 0.03]),
    (Material::Flower, [0.65, 0.60, 0.85, 0.03]),
    (Material::Bark, [0.08, 0.45, 0.54, 0.05]),
    (Material::Wood, [0.11, 0.40, 0.73, 0.05]),
    (Material::Dirt, [0.12, 0.33, 0.51, 0.02]),
    (Material::Sand, [0.16, 0.42, 0.86, 0.02]),
    (Material::Stone, [0.66, 0.06, 0.54, 0.05]),
    (Material::StoneAccent, [0.67, 0.64, 0.38, 0.03]),
    (Material::StoneAccent2, [0.99, 0.76, 0.61, 0.03]),
    (Material::StoneRoof, [0.99, 0.76, 0.45, 0.03]),
    (Material::Metal, [0.83, 0.02, 0.45, 0.03]),
    (Material::MetalAccent, [0.83, 0.02, 0.31, 0.03]),
    (Material::Sign, [0.13, 0.16, 0.87, 0.03]),
    (Material::SignText, [0.03, 0.74, 0.83, 0.03]),
    (Material::Rune, [0.96, 1.0, 0.94, 0.03]),
    (Material::Bone, [0.18, 0.13, 0.91, 0.01]),
    (Material::Crystal, [0.83, 1.0, 0.94, 0.03]),
];

/// Color rows indexed by material.
#[derive(Clone, Debug)]
pub struct Palette {
    rows: Vec<Vec<Rgb>>,
}

impl Palette {
    /// Generates every material row.
    pub fn generate() -> Self {
        let mut rows = vec![Vec::new(); Material::ALL.len()];
        for (material, [h, s, v, h_range]) in ROW_SEEDS {
            rows[material.index() as usize] = generate_palette(h, s, v, h_range);
        }
        Self { rows }
    }

    /// Color row for `material`. Materials without a row use the structure row.
    pub fn row(&self, material: Material) -> &[Rgb] {
        let row = &self.rows[material.index() as usize];
        if row.is_empty() {
            &self.rows[Material::Structure.index() as usize]
        } else {
            row
        }
    }

    /// Color of a face of `material` with the given shade.
    pub fn color(&self, material: Material, shade: u8) -> Rgb {
        get_color(self.row(material), shade)
    }
}

static PALETTE: LazyLock<Palette> = LazyLock::new(Palette::generate);

/// The shared, lazily generated palette.
pub fn palette() -> &'static Palette {
    &PALETTE
}

/// Linear remap of `value` from `in_min..in_max` to `out_min..out_max`.
fn map(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
}

/// Like [`map`], clamped to the output range.
fn map_clamped(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    map(value, in_min, in_max, out_min, out_max).clamp(out_min.min(out_max), out_min.max(out_max))
}

/// Converts HSV (each in `0..=1`) to RGB.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [r as f32, g as f32, b as f32]
}

/// Generates a palette row ramping from near-black up to `(h, s, v)`.
///
/// Less saturated and brighter rows get more colors. Hue drifts by
/// `h_range` toward warmer tones as value rises; saturation is higher at
/// the dark end.
pub fn generate_palette(h: f64, s: f64, v: f64, h_range: f64) -> Vec<Rgb> {
    let count = (PALETTE_ROW_SIZE as f64 * v * 0.99999 * map_clamped(s, 0.0, 1.0, 1.0, 0.5))
        .floor() as usize
        + 1;

    let h_dir = if h < 0.2 || h > 0.77 { 1.0 } else { -1.0 };
    let (h_min, h_max) = (h - h_range * h_dir, h + h_range * h_dir);
    let (s_min, s_max) = (1.0 - (1.0 - s) / 3.0, s);
    let (v_min, v_max) = (0.05, v);

    let last = (count - 1) as f64;
    (0..count)
        .map(|i| {
            let i = i as f64;
            let hue = map(i, 0.0, last, h_min, h_max).rem_euclid(1.0);
            let sat = map(i, 0.0, last, s_min, s_max);
            let val = map(i, 0.0, last, v_min, v_max);
            hsv_to_rgb(hue, sat, val)
        })
        .collect()
}

/// Picks the color for `shade` from a row: shade 0 is the first entry,
/// 255 the last.
pub fn get_color(row: &[Rgb], shade: u8) -> Rgb {
    let t = map_clamped(shade as f64, 0.0, MAX_SHADE as f64, 0.0, 0.99999);
    let index = (t * row.len() as f64).floor() as usize;
    row[index.min(row.len().saturating_sub(1))]
}

/// Texture coordinates of a color in the color map.
pub fn color_map_coords(rgb: Rgb) -> [f32; 2] {
    let width = COLOR_MAP_WIDTH as f64;
    let quantize = |c: f32| (c as f64 * 0.99999 * width).floor();
    let r_pix = quantize(rgb[0]);
    let g_pix = quantize(rgb[1]);
    let b_pix = quantize(rgb[2]) * width;
    [
        ((r_pix + 0.5) / width) as f32,
        ((g_pix + b_pix + 0.5) / (width * width)) as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lengths() {
        // floor(20 * 0.8 * 0.99999 * 0.75) + 1
        assert_eq!(generate_palette(0.027, 0.5, 0.8, 0.13).len(), 12);
        for (material, _) in ROW_SEEDS {
            assert!(!palette().row(material).is_empty(), "{material} has no row");
        }
    }

    #[test]
    fn test_row_ramps_from_dark() {
        let row = palette().row(Material::Grass);
        let brightness = |c: &Rgb| c.iter().copied().fold(0.0f32, f32::max);
        assert!((brightness(&row[0]) - 0.05).abs() < 1e-6);
        assert!((brightness(row.last().unwrap()) - 0.67).abs() < 1e-6);
    }

    #[test]
    fn test_placeholder_uses_structure_row() {
        let p = palette();
        assert_eq!(p.row(Material::Placeholder), p.row(Material::Structure));
    }

    #[test]
    fn test_get_color_bounds() {
        let row = palette().row(Material::Stone);
        assert_eq!(get_color(row, 0), row[0]);
        assert_eq!(get_color(row, 255), *row.last().unwrap());
    }

    #[test]
    fn test_hsv_primary_colors() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [1.0, 0.0, 0.0]);
        assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0)[1], 1.0);
        assert_eq!(hsv_to_rgb(0.5, 0.0, 0.5), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_color_map_coords() {
        assert_eq!(color_map_coords([0.0, 0.0, 0.0]), [0.5 / 32.0, 0.5 / 1024.0]);
        let [u, v] = color_map_coords([1.0, 1.0, 1.0]);
        assert_eq!(u, 31.5 / 32.0);
        assert_eq!(v, (31.0 + 31.0 * 32.0 + 0.5) / 1024.0);
    }
}
