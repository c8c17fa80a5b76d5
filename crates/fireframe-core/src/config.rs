//! Startup configuration record.
//!
//! Parsing lives in the front-end; the core only consumes the record.

use std::path::PathBuf;
use std::time::Duration;

use crate::convolution::BackendPreference;

pub const DEFAULT_WIDTH: usize = 1000;
pub const DEFAULT_HEIGHT: usize = 600;
pub const DEFAULT_PALETTE: &str = "fire";
pub const DEFAULT_SHAPE: &str = "cube";
pub const DEFAULT_COOLING: i32 = 12;
pub const DEFAULT_SWITCH_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub palette: String,
    pub shape: String,
    pub cooling: i32,
    /// Extra OBJ files, listed after the built-in shapes.
    pub mesh_files: Vec<PathBuf>,
    pub auto_rotate: bool,
    pub auto_switch: bool,
    pub switch_interval: Duration,
    pub paused: bool,
    pub still_fire: bool,
    pub gpu: bool,
    pub simd: bool,
    /// Start in wireframe-only mode instead of fire.
    pub wireframe: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            palette: DEFAULT_PALETTE.to_string(),
            shape: DEFAULT_SHAPE.to_string(),
            cooling: DEFAULT_COOLING,
            mesh_files: Vec::new(),
            auto_rotate: true,
            auto_switch: false,
            switch_interval: DEFAULT_SWITCH_INTERVAL,
            paused: false,
            still_fire: false,
            gpu: false,
            simd: true,
            wireframe: false,
        }
    }
}

impl SceneConfig {
    pub fn backend_preference(&self) -> BackendPreference {
        BackendPreference {
            gpu: self.gpu,
            simd: self.simd,
        }
    }
}
