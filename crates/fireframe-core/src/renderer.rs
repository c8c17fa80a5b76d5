//! Per-frame update policies.
//!
//! A renderer owns the three rotating surfaces of its [`FrameExchange`] and
//! the simulation-side mutable state (flicker brushes, random source, fire
//! filter). `update` runs on the simulation worker under shared scene
//! access; `present` runs on the render worker. Settings that change what a
//! frame looks like (cooling, still fire) take `&mut self` and so only change
//! under exclusive scene access.

use parking_lot::Mutex;

use crossbeam::atomic::AtomicCell;

use crate::convolution::{BackendPreference, ConvolutionBackend, ConvolveAndRise};
use crate::entity::Entity;
use crate::exchange::FrameExchange;
use crate::material::{Brush, MaterialMode};
use crate::palette::{PackedRgba, Palette};
use crate::projector::Projector;
use crate::random::FastRandom;
use crate::raster::LineRasterizer;
use crate::seed::SeedRow;
use crate::surface::FixedSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Fire,
    Wireframe,
}

impl RendererKind {
    pub const ALL: [Self; 2] = [Self::Fire, Self::Wireframe];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Wireframe => "wireframe",
        }
    }
}

/// Project `entity` onto the guarded band of `surface`.
fn draw_entity(
    projector: &Projector,
    surface: &mut FixedSurface,
    entity: &Entity,
    brush: &mut Brush,
    rng: &mut FastRandom,
) {
    let mut sink = LineRasterizer::new(surface);
    let mut pixels = entity.material.stroke(brush, rng);
    projector.draw_mesh(&mut sink, &entity.mesh, &entity.transform, &mut pixels);
}

#[derive(Debug)]
struct FireSim {
    effect: ConvolveAndRise,
    entity_brush: Brush,
    seed_brush: Brush,
    rng: FastRandom,
}

/// Diffuse the previous frame, draw the entity as fresh heat, then reseed.
#[derive(Debug)]
pub struct FireRenderer {
    exchange: FrameExchange,
    projector: Projector,
    seed: SeedRow,
    sim: Mutex<FireSim>,
    /// Mirrors the filter's back-end so status text never waits on a step.
    backend_name: AtomicCell<&'static str>,
}

impl FireRenderer {
    pub fn new(width: usize, height: usize, cooling: i32, backend: ConvolutionBackend) -> Self {
        let effect = ConvolveAndRise::new(cooling, backend);
        let backend_name = AtomicCell::new(effect.backend_name());
        Self {
            exchange: FrameExchange::new(width, height, 1),
            projector: Projector::new(width, height),
            seed: SeedRow::new(),
            sim: Mutex::new(FireSim {
                effect,
                entity_brush: Brush::new(),
                seed_brush: Brush::new(),
                rng: FastRandom::from_time(),
            }),
            backend_name,
        }
    }

    pub fn update(&self, entity: Option<&Entity>) {
        let mut sim = self.sim.lock();
        let FireSim {
            effect,
            entity_brush,
            seed_brush,
            rng,
        } = &mut *sim;
        self.exchange.produce(|front, back| {
            effect.draw(front, back);
            if let Some(entity) = entity {
                draw_entity(&self.projector, back, entity, entity_brush, rng);
            }
            self.seed.draw(back, seed_brush, rng);
        });
        self.backend_name.store(effect.backend_name());
    }

    pub fn cooling(&self) -> i32 {
        self.sim.lock().effect.cooling()
    }

    pub fn set_cooling(&mut self, cooling: i32) {
        self.sim.get_mut().effect.set_cooling(cooling);
    }

    pub fn inc_cooling(&mut self, delta: i32) {
        self.sim.get_mut().effect.inc_cooling(delta);
    }

    pub fn still_fire(&self) -> bool {
        self.seed.material().mode() == MaterialMode::Fixed
    }

    pub fn set_still_fire(&mut self, still: bool) {
        let mode = if still {
            MaterialMode::Fixed
        } else {
            MaterialMode::Flicker
        };
        self.seed.material_mut().set_mode(mode);
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name.load()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.exchange.resize(width, height, 1);
        self.projector = Projector::new(width, height);
    }
}

#[derive(Debug)]
struct WireSim {
    brush: Brush,
    rng: FastRandom,
}

/// Clear and draw the entity; no simulation.
#[derive(Debug)]
pub struct WireframeRenderer {
    exchange: FrameExchange,
    projector: Projector,
    sim: Mutex<WireSim>,
}

impl WireframeRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            exchange: FrameExchange::new(width, height, 0),
            projector: Projector::new(width, height),
            sim: Mutex::new(WireSim {
                brush: Brush::new(),
                rng: FastRandom::from_time(),
            }),
        }
    }

    pub fn update(&self, entity: Option<&Entity>) {
        let mut sim = self.sim.lock();
        let WireSim { brush, rng } = &mut *sim;
        self.exchange.produce(|_, back| {
            back.clear();
            if let Some(entity) = entity {
                draw_entity(&self.projector, back, entity, brush, rng);
            }
        });
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.exchange.resize(width, height, 0);
        self.projector = Projector::new(width, height);
    }
}

/// Either renderer, dispatched by tag.
#[derive(Debug)]
pub enum Renderer {
    Fire(FireRenderer),
    Wireframe(WireframeRenderer),
}

impl Renderer {
    pub fn new(
        kind: RendererKind,
        width: usize,
        height: usize,
        cooling: i32,
        pref: BackendPreference,
    ) -> Self {
        match kind {
            RendererKind::Fire => Self::Fire(FireRenderer::new(
                width,
                height,
                cooling,
                ConvolutionBackend::select(pref),
            )),
            RendererKind::Wireframe => Self::Wireframe(WireframeRenderer::new(width, height)),
        }
    }

    pub fn kind(&self) -> RendererKind {
        match self {
            Self::Fire(_) => RendererKind::Fire,
            Self::Wireframe(_) => RendererKind::Wireframe,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn exchange(&self) -> &FrameExchange {
        match self {
            Self::Fire(r) => &r.exchange,
            Self::Wireframe(r) => &r.exchange,
        }
    }

    /// Advance one simulation step. `None` draws no geometry.
    pub fn update(&self, entity: Option<&Entity>) {
        match self {
            Self::Fire(r) => r.update(entity),
            Self::Wireframe(r) => r.update(entity),
        }
    }

    /// Map the newest frame through `palette` into `target`.
    pub fn present(&self, palette: &Palette, target: &mut [PackedRgba]) {
        self.exchange().consume(|surface| palette.apply(surface, target));
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        match self {
            Self::Fire(r) => r.resize(width, height),
            Self::Wireframe(r) => r.resize(width, height),
        }
    }

    pub fn as_fire(&self) -> Option<&FireRenderer> {
        match self {
            Self::Fire(r) => Some(r),
            Self::Wireframe(_) => None,
        }
    }

    pub fn as_fire_mut(&mut self) -> Option<&mut FireRenderer> {
        match self {
            Self::Fire(r) => Some(r),
            Self::Wireframe(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::generators;
    use crate::surface::SCALING_SHIFT;

    fn cube(scale: f64) -> Entity {
        Entity::new("cube", generators::cube(), scale)
    }

    fn snapshot(renderer: &Renderer) -> Vec<i32> {
        renderer.exchange().consume(|s| s.data().to_vec())
    }

    #[test]
    fn fire_seeds_bottom_row_and_rises() {
        let mut inner = FireRenderer::new(16, 8, 0, ConvolutionBackend::Scalar);
        inner.set_still_fire(true);
        let fire = Renderer::Fire(inner);
        for _ in 0..10 {
            fire.update(None);
        }
        let data = snapshot(&fire);
        assert_eq!(data.len(), 16 * 9);
        assert!(data[16 * 8..].iter().all(|&v| v == 127 << SCALING_SHIFT));
        assert!(data[16 * 5..16 * 6].iter().any(|&v| v > 0), "heat should rise");
    }

    #[test]
    fn wireframe_clears_between_frames() {
        let r = Renderer::Wireframe(WireframeRenderer::new(64, 48));
        let entity = cube(40.0);
        r.update(Some(&entity));
        assert!(snapshot(&r).iter().any(|&v| v != 0));
        r.update(None);
        assert!(snapshot(&r).iter().all(|&v| v == 0));
    }

    #[test]
    fn wireframe_respects_guard_rows() {
        let r = Renderer::Wireframe(WireframeRenderer::new(32, 16));
        let mut entity = cube(400.0);
        entity.transform.set_translate_z(1.5);
        r.update(Some(&entity));
        let data = snapshot(&r);
        assert!(data[..32].iter().all(|&v| v == 0));
        assert!(data[15 * 32..].iter().all(|&v| v == 0));
    }

    #[test]
    fn still_fire_toggle_round_trips() {
        let mut f = FireRenderer::new(8, 8, 12, ConvolutionBackend::Scalar);
        assert!(!f.still_fire());
        f.set_still_fire(true);
        assert!(f.still_fire());
        f.set_still_fire(false);
        assert!(!f.still_fire());
    }

    #[test]
    fn cooling_changes_are_visible() {
        let mut f = FireRenderer::new(8, 8, 12, ConvolutionBackend::Scalar);
        f.inc_cooling(1);
        assert_eq!(f.cooling(), 13);
        f.set_cooling(-4);
        assert_eq!(f.cooling(), 13);
        assert_eq!(f.backend_name(), "Scalar");
    }

    #[test]
    fn present_uses_palette() {
        let r = Renderer::Wireframe(WireframeRenderer::new(4, 4));
        let mut target = vec![PackedRgba::WHITE; 16];
        r.update(None);
        r.present(&Palette::grayscale(), &mut target);
        assert!(target.iter().all(|&c| c == PackedRgba::BLACK));
    }

    #[test]
    fn resize_changes_surface_shape() {
        let mut r = Renderer::new(RendererKind::Fire, 8, 8, 12, BackendPreference::default());
        r.resize(10, 4);
        assert_eq!(snapshot(&r).len(), 10 * 5);
        assert_eq!(r.name(), "fire");
    }
}
