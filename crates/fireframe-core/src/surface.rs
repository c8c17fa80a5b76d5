#![forbid(unsafe_code)]

//! Fixed-point intensity surface.
//!
//! Samples are `i32` intensities scaled by [`SCALING`] (`1 << SCALING_SHIFT`)
//! so the fire filter keeps sub-unit precision without floating point. A
//! surface may carry extra rows below its drawable `height`; the fire
//! renderer uses one such row for its seed line.
//!
//! # Bounds
//!
//! Every write goes through a checked index. Out-of-range draws are dropped
//! silently; the hot loops in [`crate::convolution`] work on pre-sliced
//! windows instead.

/// Number of fractional bits in a fixed-point intensity.
pub const SCALING_SHIFT: u32 = 8;

/// `1.0` in fixed-point.
pub const SCALING: i32 = 1 << SCALING_SHIFT;

/// Row-major buffer of fixed-point intensity samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSurface {
    width: usize,
    height: usize,
    data: Vec<i32>,
}

impl FixedSurface {
    /// Create a zeroed surface with `extra_rows` rows past the drawable area.
    pub fn new(width: usize, height: usize, extra_rows: usize) -> Self {
        let len = width.saturating_mul(height.saturating_add(extra_rows));
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Wrap existing samples. `data.len()` may exceed `width * height`.
    pub fn from_data(width: usize, height: usize, data: Vec<i32>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Drawable height (extra rows excluded).
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [i32] {
        &mut self.data
    }

    /// Number of samples in the drawable area.
    #[inline]
    pub fn visible_len(&self) -> usize {
        (self.width * self.height).min(self.data.len())
    }

    /// Write a sample by linear index; out-of-range indices are ignored.
    #[inline]
    pub fn set(&mut self, index: usize, value: i32) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = value;
        }
    }

    /// Read a sample by linear index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<i32> {
        self.data.get(index).copied()
    }

    /// Zero every sample, extra rows included.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Fill every sample with `value`.
    pub fn fill(&mut self, value: i32) {
        self.data.fill(value);
    }
}
