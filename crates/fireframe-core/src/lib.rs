#![forbid(unsafe_code)]

//! Fireframe core: a fixed-point fire simulation with a rotating wireframe
//! drawn into it.
//!
//! The simulation worker diffuses heat upward through a [`surface`] with the
//! [`convolution`] filter, projects the active [`entity`] through the
//! [`projector`] and [`raster`] stages as fresh heat, and publishes the frame
//! through a lock-free [`exchange`]. The render worker maps the newest frame
//! through a [`palette`] into a pixel target. [`scene`] ties the two together
//! and exposes the command surface.

pub mod config;
pub mod convolution;
pub mod entity;
pub mod exchange;
pub mod geometry;
pub mod material;
pub mod mesh;
pub mod palette;
pub mod perf;
pub mod projector;
pub mod random;
pub mod raster;
pub mod renderer;
pub mod scene;
pub mod seed;
pub mod surface;

pub use config::SceneConfig;
pub use palette::{PackedRgba, PixelBuffer};
pub use scene::SceneController;
