//! Pixel-value policies for drawn lines.
//!
//! A [`Material`] says *what* intensity a line deposits: either a constant
//! or a value that flickers between zero and a peak. The flicker state
//! itself (counter and current value) lives in a [`Brush`], which the
//! simulation side owns, so a material can be read concurrently while a
//! single writer advances its brush.

use crate::mesh::Mesh;
use crate::random::FastRandom;
use crate::surface::SCALING_SHIFT;

/// Line length of the unit cube after normalization, used as the baseline
/// for intensity scaling.
const REFERENCE_TOTAL_LENGTH: f64 = 24.0;
const BASE_FIXED_VALUE: f64 = 128.0;
const BASE_FLICKER_VALUE: f64 = 192.0;

/// Flicker re-rolls its value once every this many pixels.
pub const FLICKER_UPDATE_FREQUENCY: u32 = 3;

/// Something that yields successive pixel values for a stroke.
pub trait PixelSource {
    fn next_pixel(&mut self) -> i32;
}

/// A constant source.
impl PixelSource for i32 {
    #[inline]
    fn next_pixel(&mut self) -> i32 {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialMode {
    #[default]
    Fixed,
    Flicker,
}

impl MaterialMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Fixed => Self::Flicker,
            Self::Flicker => Self::Fixed,
        }
    }
}

/// Fixed and flicker intensities (already fixed-point) plus the active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    fixed: i32,
    flicker: i32,
    mode: MaterialMode,
}

impl Material {
    /// Build from 8-bit intensities; they are shifted into fixed-point.
    pub fn new(fixed: u8, flicker: u8) -> Self {
        Self {
            fixed: i32::from(fixed) << SCALING_SHIFT,
            flicker: i32::from(flicker) << SCALING_SHIFT,
            mode: MaterialMode::Fixed,
        }
    }

    /// Intensities scaled down for meshes with a lot of line length so dense
    /// shapes don't saturate the fire.
    pub fn for_mesh(mesh: &Mesh) -> Self {
        let ratio = (REFERENCE_TOTAL_LENGTH / mesh.total_line_length().max(1.0)).sqrt();
        let fixed = ((BASE_FIXED_VALUE * ratio) as i32).clamp(32, 255);
        let flicker = ((BASE_FLICKER_VALUE * ratio) as i32).clamp(48, 255);
        Self::new(fixed as u8, flicker as u8)
    }

    #[must_use]
    pub fn with_mode(mut self, mode: MaterialMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn mode(&self) -> MaterialMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MaterialMode) {
        self.mode = mode;
    }

    pub fn toggle(&mut self) {
        self.mode = self.mode.toggled();
    }

    #[inline]
    pub fn fixed_value(&self) -> i32 {
        self.fixed
    }

    #[inline]
    pub fn flicker_value(&self) -> i32 {
        self.flicker
    }

    /// Pair this material with a brush and random source for one stroke.
    pub fn stroke<'a>(&'a self, brush: &'a mut Brush, rng: &'a mut FastRandom) -> Stroke<'a> {
        Stroke {
            material: self,
            brush,
            rng,
        }
    }
}

/// Flicker state carried between pixels and frames.
#[derive(Debug, Clone, Default)]
pub struct Brush {
    counter: u32,
    current: i32,
}

impl Brush {
    pub fn new() -> Self {
        Self::default()
    }

    fn pixel(&mut self, material: &Material, rng: &mut FastRandom) -> i32 {
        match material.mode {
            MaterialMode::Fixed => material.fixed,
            MaterialMode::Flicker => {
                if self.counter % FLICKER_UPDATE_FREQUENCY == 0 {
                    self.current = if rng.next_bool() { material.flicker } else { 0 };
                    self.counter = 0;
                }
                self.counter += 1;
                self.current
            }
        }
    }
}

/// A material borrowed together with the mutable state needed to draw it.
pub struct Stroke<'a> {
    material: &'a Material,
    brush: &'a mut Brush,
    rng: &'a mut FastRandom,
}

impl PixelSource for Stroke<'_> {
    #[inline]
    fn next_pixel(&mut self) -> i32 {
        self.brush.pixel(self.material, self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    #[test]
    fn fixed_mode_is_constant() {
        let m = Material::new(127, 255);
        let mut brush = Brush::new();
        let mut rng = FastRandom::new(3);
        let mut s = m.stroke(&mut brush, &mut rng);
        for _ in 0..10 {
            assert_eq!(s.next_pixel(), 127 << SCALING_SHIFT);
        }
    }

    #[test]
    fn flicker_holds_value_for_three_pixels() {
        let m = Material::new(127, 255).with_mode(MaterialMode::Flicker);
        let mut brush = Brush::new();
        let mut rng = FastRandom::new(99);
        let mut s = m.stroke(&mut brush, &mut rng);
        let values: Vec<i32> = (0..30).map(|_| s.next_pixel()).collect();
        for chunk in values.chunks(3) {
            assert!(chunk.iter().all(|&v| v == chunk[0]));
            assert!(chunk[0] == 0 || chunk[0] == 255 << SCALING_SHIFT);
        }
    }

    #[test]
    fn toggle_twice_restores_mode() {
        let mut m = Material::new(10, 20);
        let before = m.mode();
        m.toggle();
        assert_eq!(m.mode(), MaterialMode::Flicker);
        m.toggle();
        assert_eq!(m.mode(), before);
    }

    #[test]
    fn for_mesh_scales_with_line_length() {
        let short = Mesh::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(24.0, 0.0, 0.0)],
            vec![[0, 1]],
        );
        let m = Material::for_mesh(&short);
        assert_eq!(m.fixed_value(), 128 << SCALING_SHIFT);
        assert_eq!(m.flicker_value(), 192 << SCALING_SHIFT);

        let long = Mesh::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(96.0, 0.0, 0.0)],
            vec![[0, 1]],
        );
        let m = Material::for_mesh(&long);
        assert_eq!(m.fixed_value(), 64 << SCALING_SHIFT);
        assert_eq!(m.flicker_value(), 96 << SCALING_SHIFT);
    }

    #[test]
    fn for_mesh_clamps_empty_mesh() {
        let m = Material::for_mesh(&Mesh::empty());
        // ratio = sqrt(24), so both saturate.
        assert_eq!(m.fixed_value(), 255 << SCALING_SHIFT);
        assert_eq!(m.flicker_value(), 255 << SCALING_SHIFT);
    }
}
