//! Frame and update rate counters.
//!
//! Both workers bump their counter lock-free; whoever asks for stats after a
//! full window has elapsed gets the rates and starts a new window.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Minimum window before rates are reported.
pub const STATS_WINDOW: Duration = Duration::from_millis(1000);

/// Rates over one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateStats {
    pub fps: f64,
    pub ups: f64,
}

impl fmt::Display for RateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fire: {:.1} FPS / {:.1} UPS", self.fps, self.ups)
    }
}

#[derive(Debug)]
pub struct PerformanceMonitor {
    origin: Instant,
    /// Window start, as microseconds since `origin`.
    window_start_us: AtomicU64,
    frames: AtomicU32,
    updates: AtomicU32,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(origin: Instant) -> Self {
        Self {
            origin,
            window_start_us: AtomicU64::new(0),
            frames: AtomicU32::new(0),
            updates: AtomicU32::new(0),
        }
    }

    fn micros(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_micros() as u64
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats_and_reset(&self) -> Option<RateStats> {
        self.stats_and_reset_at(Instant::now())
    }

    /// Rates since the window started, if more than [`STATS_WINDOW`] has
    /// passed; the counters restart from `now`.
    pub fn stats_and_reset_at(&self, now: Instant) -> Option<RateStats> {
        let now_us = self.micros(now);
        let start = self.window_start_us.load(Ordering::Acquire);
        let elapsed_us = now_us.saturating_sub(start);
        if elapsed_us <= STATS_WINDOW.as_micros() as u64 {
            return None;
        }
        // Only one caller wins the window.
        self.window_start_us
            .compare_exchange(start, now_us, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        let frames = self.frames.swap(0, Ordering::Relaxed);
        let updates = self.updates.swap(0, Ordering::Relaxed);
        let secs = elapsed_us as f64 / 1_000_000.0;
        Some(RateStats {
            fps: f64::from(frames) / secs,
            ups: f64::from(updates) / secs,
        })
    }

    pub fn reset(&self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&self, now: Instant) {
        self.window_start_us.store(self.micros(now), Ordering::Release);
        self.frames.store(0, Ordering::Relaxed);
        self.updates.store(0, Ordering::Relaxed);
    }
}
