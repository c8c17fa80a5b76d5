#![forbid(unsafe_code)]

//! Scene orchestration: selection state, the two workers, and commands.
//!
//! # Locking
//!
//! Scene state sits behind one reader/writer lock. Commands take it
//! exclusively. The simulation step takes it exclusively to check pause,
//! auto-switch and auto-rotate, then downgrades to shared access for the
//! heavy work, so no command can slip in between the check and the frame
//! that depends on it. The render step only reads.
//!
//! Lock order is always scene state, then renderer-internal mutexes, then
//! the pixel target.
//!
//! # Workers
//!
//! `start` spawns a simulation thread that runs steps back to back (sleeping
//! only while paused) and a render thread that presents at the display's
//! refresh period. `stop` clears the running flag and joins each worker with
//! a bounded wait.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};

use crate::config::SceneConfig;
use crate::entity::{Entity, EntityTable, INITIAL_SCALE_FACTOR};
use crate::material::MaterialMode;
use crate::palette::{Palette, PixelBuffer};
use crate::perf::{PerformanceMonitor, RateStats};
use crate::renderer::{Renderer, RendererKind};

/// Sleep between steps while paused.
pub const PAUSED_SLEEP: Duration = Duration::from_millis(100);
/// Render period when the display reports no usable refresh rate.
pub const DEFAULT_FRAME_PERIOD: Duration = Duration::from_millis(16);
/// Upper bound on each worker join in [`SceneController::stop`].
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Auto-rotate speed about X, radians per second.
const AUTO_ROTATE_X: f64 = 1.0;
/// Auto-rotate speed about Y, radians per second.
const AUTO_ROTATE_Y: f64 = 2.0;
/// Radians of rotation per unit of pointer drag.
const DRAG_SENSITIVITY: f64 = 0.01;

pub type FrameReadyFn = Box<dyn Fn() + Send + Sync>;
pub type TitleFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Render period for a refresh rate in Hz, never shorter than 1 ms.
pub fn frame_period(refresh_rate: Option<u32>) -> Duration {
    match refresh_rate {
        Some(hz) if hz > 0 => Duration::from_millis((1000 / u64::from(hz)).max(1)),
        _ => DEFAULT_FRAME_PERIOD,
    }
}

fn wrap_next(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (index + 1) % len }
}

fn wrap_prev(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (index + len - 1) % len }
}

/// Index of a looked-up name, falling back to the first entry.
fn resolve(kind: &str, wanted: &str, found: Option<usize>, first: Option<&str>) -> usize {
    found.unwrap_or_else(|| {
        let fallback = first.unwrap_or("");
        tracing::warn!("Unknown {kind} '{wanted}', using '{fallback}'");
        0
    })
}

/// Everything commands mutate.
#[derive(Debug)]
struct SceneState {
    palettes: Vec<Palette>,
    palette_index: usize,
    entities: EntityTable,
    shape_index: usize,
    renderers: Vec<Renderer>,
    renderer_index: usize,
    paused: bool,
    auto_rotate: bool,
    /// Next auto-switch time; `None` when auto-switch is off.
    next_switch: Option<Instant>,
    switch_interval: Duration,
}

impl SceneState {
    fn new(config: &SceneConfig) -> Self {
        let palettes = Palette::builtins();
        let palette_index = resolve(
            "palette",
            &config.palette,
            palettes
                .iter()
                .position(|p| p.name().eq_ignore_ascii_case(&config.palette)),
            palettes.first().map(Palette::name),
        );

        let scale = config.width.min(config.height) as f64 * INITIAL_SCALE_FACTOR;
        let entities = EntityTable::with_external(&config.mesh_files, scale);
        let shape_index = resolve(
            "shape",
            &config.shape,
            entities.index_of(&config.shape),
            entities.name(0),
        );

        let pref = config.backend_preference();
        let mut renderers: Vec<Renderer> = RendererKind::ALL
            .iter()
            .map(|&kind| Renderer::new(kind, config.width, config.height, config.cooling, pref))
            .collect();
        for r in &mut renderers {
            if let Some(fire) = r.as_fire_mut() {
                fire.set_still_fire(config.still_fire);
            }
        }
        let renderer_index = RendererKind::ALL
            .iter()
            .position(|&k| k == RendererKind::Wireframe)
            .filter(|_| config.wireframe)
            .unwrap_or(0);

        Self {
            palettes,
            palette_index,
            entities,
            shape_index,
            renderers,
            renderer_index,
            paused: config.paused,
            auto_rotate: config.auto_rotate,
            // Starts expired so the first step switches immediately.
            next_switch: config.auto_switch.then(Instant::now),
            switch_interval: config.switch_interval,
        }
    }

    fn palette(&self) -> Option<&Palette> {
        self.palettes.get(self.palette_index)
    }

    fn palette_name(&self) -> &str {
        self.palette().map(Palette::name).unwrap_or("")
    }

    fn shape_name(&self) -> &str {
        self.entities.name(self.shape_index).unwrap_or("")
    }

    fn renderer(&self) -> Option<&Renderer> {
        self.renderers.get(self.renderer_index)
    }

    fn fire(&self) -> Option<&crate::renderer::FireRenderer> {
        self.renderers.iter().find_map(Renderer::as_fire)
    }

    fn fire_mut(&mut self) -> Option<&mut crate::renderer::FireRenderer> {
        self.renderers.iter_mut().find_map(Renderer::as_fire_mut)
    }

    fn entity(&self) -> Option<&Entity> {
        self.entities.get(self.shape_index)
    }

    fn entity_mut(&mut self) -> Option<&mut Entity> {
        self.entities.get_mut(self.shape_index)
    }

    fn next_palette(&mut self) {
        self.palette_index = wrap_next(self.palette_index, self.palettes.len());
    }

    fn next_shape(&mut self) {
        self.shape_index = wrap_next(self.shape_index, self.entities.len());
    }

    /// Advance palette (and shape on wrap) once the deadline has passed.
    fn switch_if_needed(&mut self, now: Instant) -> bool {
        match self.next_switch {
            Some(deadline) if now >= deadline => {
                self.next_switch = Some(now + self.switch_interval);
                self.next_palette();
                if self.palette_index == 0 {
                    self.next_shape();
                }
                true
            }
            _ => false,
        }
    }

    fn title(&self, stats: Option<&RateStats>) -> String {
        let backend = self.fire().map(|f| f.backend_name()).unwrap_or("");
        let renderer = self.renderer().map(Renderer::name).unwrap_or("");
        let mut title = format!(
            "{renderer} | {backend} | {} | {}",
            self.shape_name(),
            self.palette_name()
        );
        if let Some(stats) = stats {
            title.push_str(&format!(" | {stats}"));
        }
        title
    }

    fn resize(&mut self, width: usize, height: usize) {
        for r in &mut self.renderers {
            r.resize(width, height);
        }
    }
}

struct Shared {
    state: RwLock<SceneState>,
    target: Arc<Mutex<PixelBuffer>>,
    perf: PerformanceMonitor,
    running: AtomicBool,
    last_stats: Mutex<Option<RateStats>>,
    on_title: Mutex<Option<TitleFn>>,
}

impl Shared {
    fn emit_title(&self, title: &str) {
        let callback = self.on_title.lock().clone();
        if let Some(callback) = callback {
            callback(title);
        }
    }

    fn current_title(&self) -> String {
        let stats = *self.last_stats.lock();
        self.state.read().title(stats.as_ref())
    }

    /// One simulation step. Returns `false` (doing nothing) while paused.
    fn step(&self, delta: Duration) -> bool {
        let mut state = self.state.write();
        if state.paused {
            return false;
        }
        let switched = state.switch_if_needed(Instant::now());
        if state.auto_rotate && !delta.is_zero() {
            let dt = delta.as_secs_f64();
            if let Some(entity) = state.entity_mut() {
                entity
                    .transform
                    .rotate(AUTO_ROTATE_X * dt, AUTO_ROTATE_Y * dt);
            }
        }

        let state = RwLockWriteGuard::downgrade(state);
        if let Some(renderer) = state.renderer() {
            renderer.update(state.entity());
        }
        let title = switched.then(|| state.title(self.last_stats.lock().as_ref()));
        drop(state);

        if let Some(title) = title {
            self.emit_title(&title);
        }
        true
    }

    /// Map the newest frame into the pixel target.
    fn render(&self) {
        let state = self.state.read();
        let (Some(renderer), Some(palette)) = (state.renderer(), state.palette()) else {
            return;
        };
        let mut target = self.target.lock();
        renderer.present(palette, target.pixels_mut());
    }

    fn simulation_loop(&self) {
        let mut last = Instant::now();
        while self.running.load(Ordering::Acquire) {
            let now = Instant::now();
            let delta = now.saturating_duration_since(last);
            last = now;
            if self.step(delta) {
                self.perf.record_update();
            } else {
                thread::sleep(PAUSED_SLEEP);
            }
        }
    }

    fn render_loop(&self, period: Duration, on_frame_ready: FrameReadyFn) {
        while self.running.load(Ordering::Acquire) {
            self.render();
            self.perf.record_frame();
            on_frame_ready();
            if let Some(stats) = self.perf.stats_and_reset() {
                *self.last_stats.lock() = Some(stats);
                let title = self.current_title();
                self.emit_title(&title);
            }
            thread::sleep(period);
        }
    }
}

/// Owns the scene and its workers; every method is a user command or a
/// read-only query.
pub struct SceneController {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for SceneController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneController")
            .field("running", &self.is_running())
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl SceneController {
    pub fn new(config: &SceneConfig) -> Self {
        let state = SceneState::new(config);
        tracing::info!(
            width = config.width,
            height = config.height,
            palette = state.palette_name(),
            shape = state.shape_name(),
            renderer = state.renderer().map(Renderer::name).unwrap_or(""),
            "scene initialized"
        );
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(state),
                target: Arc::new(Mutex::new(PixelBuffer::new(config.width, config.height))),
                perf: PerformanceMonitor::new(),
                running: AtomicBool::new(false),
                last_stats: Mutex::new(None),
                on_title: Mutex::new(None),
            }),
            workers: Vec::new(),
        }
    }

    /// The pixel buffer the render worker writes into.
    pub fn target(&self) -> Arc<Mutex<PixelBuffer>> {
        Arc::clone(&self.shared.target)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Spawn both workers. A second call while running is a no-op.
    pub fn start(
        &mut self,
        refresh_rate: Option<u32>,
        on_frame_ready: FrameReadyFn,
        on_title: TitleFn,
    ) -> io::Result<()> {
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        *self.shared.on_title.lock() = Some(on_title);
        self.shared.emit_title(&self.shared.current_title());
        self.shared.perf.reset();

        let period = frame_period(refresh_rate);
        tracing::info!(period_ms = period.as_millis() as u64, "starting scene workers");

        let sim = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("fireframe-sim".into())
            .spawn(move || sim.simulation_loop());
        self.track(spawned)?;

        let render = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("fireframe-render".into())
            .spawn(move || render.render_loop(period, on_frame_ready));
        self.track(spawned)
    }

    fn track(&mut self, spawned: io::Result<JoinHandle<()>>) -> io::Result<()> {
        match spawned {
            Ok(handle) => {
                self.workers.push(handle);
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn scene worker");
                self.stop();
                Err(err)
            }
        }
    }

    /// Clear the running flag and join each worker, waiting at most
    /// [`JOIN_TIMEOUT`] per worker. Stragglers are detached.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        for handle in self.workers.drain(..) {
            let deadline = Instant::now() + JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            let name = handle.thread().name().unwrap_or("worker").to_owned();
            if !handle.is_finished() {
                tracing::warn!(worker = %name, "worker did not stop in time; detaching");
                continue;
            }
            if let Err(payload) = handle.join() {
                let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_owned()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic payload".to_owned()
                };
                tracing::error!(worker = %name, "worker panicked: {msg}");
            }
        }
    }

    /// Run one simulation step on the calling thread.
    pub fn step(&self, delta: Duration) -> bool {
        self.shared.step(delta)
    }

    /// Present the newest frame into the pixel target on the calling thread.
    pub fn render(&self) {
        self.shared.render();
    }

    pub fn title(&self) -> String {
        self.shared.current_title()
    }

    /// Apply `f` under exclusive access, then publish the title if asked.
    fn command(&self, retitle: bool, f: impl FnOnce(&mut SceneState)) {
        let title = {
            let mut state = self.shared.state.write();
            f(&mut state);
            retitle.then(|| state.title(self.shared.last_stats.lock().as_ref()))
        };
        if let Some(title) = title {
            self.shared.emit_title(&title);
        }
    }

    pub fn next_palette(&self) {
        self.command(true, SceneState::next_palette);
    }

    pub fn previous_palette(&self) {
        self.command(true, |s| {
            s.palette_index = wrap_prev(s.palette_index, s.palettes.len());
        });
    }

    pub fn next_shape(&self) {
        self.command(true, SceneState::next_shape);
    }

    pub fn previous_shape(&self) {
        self.command(true, |s| {
            s.shape_index = wrap_prev(s.shape_index, s.entities.len());
        });
    }

    /// Rotate by a pointer drag: `dx` turns about Y, `dy` about X.
    pub fn rotate(&self, dx: f64, dy: f64) {
        self.command(false, |s| {
            if let Some(e) = s.entity_mut() {
                e.transform.rotate(dy * DRAG_SENSITIVITY, dx * DRAG_SENSITIVITY);
            }
        });
    }

    pub fn increase_scale(&self, amount: f64) {
        self.command(false, |s| {
            if let Some(e) = s.entity_mut() {
                e.transform.inc_scale(amount);
            }
        });
    }

    pub fn increase_depth(&self, amount: f64) {
        self.command(false, |s| {
            if let Some(e) = s.entity_mut() {
                e.transform.inc_translate_z(amount);
            }
        });
    }

    /// Toggle the active shape between fixed and flickering lines.
    pub fn toggle_still_shape(&self) {
        self.command(false, |s| {
            if let Some(e) = s.entity_mut() {
                e.material.toggle();
            }
        });
    }

    /// Toggle the seed row between constant and flickering heat.
    pub fn toggle_still_fire(&self) {
        self.command(false, |s| {
            if let Some(fire) = s.fire_mut() {
                let still = fire.still_fire();
                fire.set_still_fire(!still);
            }
        });
    }

    pub fn toggle_auto_rotate(&self) {
        self.command(false, |s| s.auto_rotate = !s.auto_rotate);
    }

    pub fn toggle_auto_switch(&self) {
        self.command(false, |s| {
            s.next_switch = match s.next_switch {
                Some(_) => None,
                None => Some(Instant::now()),
            };
        });
    }

    pub fn increase_cooling(&self) {
        self.command(false, |s| {
            if let Some(fire) = s.fire_mut() {
                fire.inc_cooling(1);
            }
        });
    }

    pub fn decrease_cooling(&self) {
        self.command(false, |s| {
            if let Some(fire) = s.fire_mut() {
                fire.inc_cooling(-1);
            }
        });
    }

    pub fn toggle_renderer(&self) {
        self.command(true, |s| {
            s.renderer_index = wrap_next(s.renderer_index, s.renderers.len());
        });
    }

    pub fn toggle_pause(&self) {
        self.command(false, |s| s.paused = !s.paused);
    }

    /// Rebuild every surface and the pixel target for a new viewport.
    pub fn resize(&self, width: usize, height: usize) {
        tracing::debug!(width, height, "resizing scene");
        {
            let mut state = self.shared.state.write();
            state.resize(width, height);
            self.shared.target.lock().resize(width, height);
        }
        self.shared.perf.reset();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn palette_name(&self) -> String {
        self.shared.state.read().palette_name().to_owned()
    }

    pub fn shape_name(&self) -> String {
        self.shared.state.read().shape_name().to_owned()
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.shared
            .state
            .read()
            .renderer()
            .map(Renderer::kind)
            .unwrap_or(RendererKind::Fire)
    }

    pub fn palette_names(&self) -> Vec<String> {
        let state = self.shared.state.read();
        state.palettes.iter().map(|p| p.name().to_owned()).collect()
    }

    pub fn shape_names(&self) -> Vec<String> {
        let state = self.shared.state.read();
        state.entities.names().map(str::to_owned).collect()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.state.read().paused
    }

    pub fn auto_rotate(&self) -> bool {
        self.shared.state.read().auto_rotate
    }

    pub fn auto_switch(&self) -> bool {
        self.shared.state.read().next_switch.is_some()
    }

    pub fn cooling(&self) -> Option<i32> {
        self.shared.state.read().fire().map(|f| f.cooling())
    }

    pub fn still_fire(&self) -> bool {
        self.shared
            .state
            .read()
            .fire()
            .is_some_and(|f| f.still_fire())
    }

    /// Material mode of the active shape, `None` if it has nothing to draw.
    pub fn shape_material_mode(&self) -> Option<MaterialMode> {
        self.shared.state.read().entity().map(|e| e.material.mode())
    }

    /// Transform of the active shape.
    pub fn shape_transform(&self) -> Option<crate::geometry::Transform> {
        self.shared.state.read().entity().map(|e| e.transform)
    }

    pub fn backend_name(&self) -> &'static str {
        self.shared
            .state
            .read()
            .fire()
            .map(|f| f.backend_name())
            .unwrap_or("")
    }
}

impl Drop for SceneController {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PackedRgba;

    fn small() -> SceneConfig {
        SceneConfig {
            width: 64,
            height: 48,
            simd: false,
            ..SceneConfig::default()
        }
    }

    #[test]
    fn unknown_names_fall_back_to_first() {
        let scene = SceneController::new(&SceneConfig {
            palette: "no-such".into(),
            shape: "blob".into(),
            ..small()
        });
        assert_eq!(scene.palette_name(), "fire");
        assert_eq!(scene.shape_name(), "cube");
    }

    #[test]
    fn names_resolve_case_insensitively() {
        let scene = SceneController::new(&SceneConfig {
            palette: "MATRIX".into(),
            shape: "Torus".into(),
            ..small()
        });
        assert_eq!(scene.palette_name(), "matrix");
        assert_eq!(scene.shape_name(), "torus");
    }

    #[test]
    fn palette_and_shape_cycle_both_ways() {
        let scene = SceneController::new(&small());
        scene.previous_palette();
        assert_eq!(scene.palette_name(), "grayscale");
        scene.next_palette();
        assert_eq!(scene.palette_name(), "fire");
        scene.previous_shape();
        assert_eq!(scene.shape_name(), "none");
        scene.next_shape();
        assert_eq!(scene.shape_name(), "cube");
    }

    #[test]
    fn paused_step_does_nothing() {
        let scene = SceneController::new(&SceneConfig {
            paused: true,
            ..small()
        });
        let before = scene.shape_transform();
        assert!(!scene.step(Duration::from_millis(50)));
        assert_eq!(scene.shape_transform(), before);
    }

    #[test]
    fn auto_rotate_uses_elapsed_time() {
        let scene = SceneController::new(&small());
        let before = scene.shape_transform().unwrap().orientation;
        assert!(scene.step(Duration::ZERO));
        assert_eq!(scene.shape_transform().unwrap().orientation, before);
        assert!(scene.step(Duration::from_millis(100)));
        assert_ne!(scene.shape_transform().unwrap().orientation, before);
    }

    #[test]
    fn auto_switch_fires_immediately_then_waits() {
        let scene = SceneController::new(&SceneConfig {
            auto_switch: true,
            switch_interval: Duration::from_secs(3600),
            ..small()
        });
        scene.step(Duration::ZERO);
        assert_eq!(scene.palette_name(), "evil");
        scene.step(Duration::ZERO);
        assert_eq!(scene.palette_name(), "evil");
    }

    #[test]
    fn enabling_auto_switch_switches_on_next_step() {
        let scene = SceneController::new(&SceneConfig {
            switch_interval: Duration::from_secs(3600),
            ..small()
        });
        scene.step(Duration::ZERO);
        assert_eq!(scene.palette_name(), "fire");
        scene.toggle_auto_switch();
        assert!(scene.auto_switch());
        scene.step(Duration::ZERO);
        assert_eq!(scene.palette_name(), "evil");
        scene.step(Duration::ZERO);
        assert_eq!(scene.palette_name(), "evil");
    }

    #[test]
    fn palette_wrap_advances_shape() {
        let mut state = SceneState::new(&SceneConfig {
            palette: "grayscale".into(),
            auto_switch: true,
            ..small()
        });
        assert!(state.switch_if_needed(Instant::now()));
        assert_eq!(state.palette_name(), "fire");
        assert_eq!(state.shape_name(), "pyramid");
    }

    #[test]
    fn title_lists_renderer_backend_shape_palette() {
        let scene = SceneController::new(&small());
        assert_eq!(scene.title(), "fire | Scalar | cube | fire");
        scene.toggle_renderer();
        assert!(scene.title().starts_with("wireframe | Scalar | cube"));
    }

    #[test]
    fn commands_emit_titles() {
        let mut scene = SceneController::new(&SceneConfig {
            paused: true,
            ..small()
        });
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&seen);
        scene
            .start(Some(1000), Box::new(|| {}), Arc::new(move |t: &str| sink.lock().push(t.to_owned())))
            .unwrap();
        scene.next_palette();
        scene.stop();
        let seen = seen.lock();
        assert!(seen.iter().any(|t| t.ends_with("| evil")));
    }

    #[test]
    fn wireframe_start_mode() {
        let scene = SceneController::new(&SceneConfig {
            wireframe: true,
            ..small()
        });
        assert_eq!(scene.renderer_kind(), RendererKind::Wireframe);
    }

    #[test]
    fn frame_period_falls_back() {
        assert_eq!(frame_period(Some(50)), Duration::from_millis(20));
        assert_eq!(frame_period(Some(0)), DEFAULT_FRAME_PERIOD);
        assert_eq!(frame_period(Some(5000)), Duration::from_millis(1));
        assert_eq!(frame_period(None), DEFAULT_FRAME_PERIOD);
    }

    #[test]
    fn idle_renders_show_the_same_frame() {
        let scene = SceneController::new(&small());
        for _ in 0..20 {
            scene.step(Duration::from_millis(16));
        }
        scene.toggle_pause();
        let target = scene.target();
        let mut frames = Vec::new();
        for _ in 0..3 {
            scene.render();
            frames.push(target.lock().pixels().to_vec());
        }
        assert!(frames[0].iter().any(|&p| p != PackedRgba::BLACK));
        assert_eq!(frames[0], frames[1]);
        assert_eq!(frames[1], frames[2]);
    }

    #[test]
    fn resize_rebuilds_target() {
        let scene = SceneController::new(&small());
        scene.resize(10, 6);
        let target = scene.target();
        let target = target.lock();
        assert_eq!((target.width(), target.height()), (10, 6));
    }
}
