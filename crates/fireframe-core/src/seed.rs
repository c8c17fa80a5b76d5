//! Heat source row for the fire.
//!
//! The fire surface carries one extra row below its drawable area. Every
//! simulation step stamps that row with fresh heat, which the filter then
//! lifts into the visible rows.

use crate::material::{Brush, Material, MaterialMode, PixelSource};
use crate::random::FastRandom;
use crate::surface::FixedSurface;

const SEED_FIXED: u8 = 127;
const SEED_FLICKER: u8 = 255;

/// Seed-row policy. Starts flickering; "still fire" switches to fixed.
#[derive(Debug, Clone)]
pub struct SeedRow {
    material: Material,
}

impl SeedRow {
    pub fn new() -> Self {
        Self {
            material: Material::new(SEED_FIXED, SEED_FLICKER).with_mode(MaterialMode::Flicker),
        }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Fill row `height` (the first row past the drawable area).
    pub fn draw(&self, surface: &mut FixedSurface, brush: &mut Brush, rng: &mut FastRandom) {
        let (width, height) = (surface.width(), surface.height());
        let mut pixels = self.material.stroke(brush, rng);
        for x in 0..width {
            surface.set(width * height + x, pixels.next_pixel());
        }
    }
}

impl Default for SeedRow {
    fn default() -> Self {
        Self::new()
    }
}
