//! Convolve-and-rise fire filter.
//!
//! Each output pixel is the sum of five source taps below it, divided by
//! `5 * SCALING + cooling`. The division is replaced by a precomputed
//! reciprocal and an arithmetic shift, so the hot loop is integer
//! multiply-add only.
//!
//! # Back-ends
//!
//! | Back-end | Notes |
//! |----------|-------|
//! | [`Scalar`](ConvolutionBackend::Scalar) | 4x unrolled, always available |
//! | [`Lanes`](ConvolutionBackend::Lanes) | fixed-width lane blocks plus a scalar tail |
//! | `Gpu` | wgpu compute shader, feature `gpu` |
//!
//! All back-ends use the same wrapping `i32` arithmetic and must agree with
//! the scalar result within [`TOLERANCE`] raw units per pixel.
//! [`ConvolutionBackend::select`] never fails: it walks down the list until
//! a back-end is usable.

pub mod lanes;
pub mod scalar;

#[cfg(feature = "gpu")]
pub mod gpu;

use crate::surface::{FixedSurface, SCALING, SCALING_SHIFT};

/// Fractional bits of the reciprocal.
pub const RECIPROCAL_SHIFT: u32 = 14;

/// Maximum per-pixel difference allowed between back-ends.
pub const TOLERANCE: i32 = 4;

/// Cooling the filter starts from before a configured value is applied.
pub const FILTER_INITIAL_COOLING: i32 = 3;

/// Reciprocal of `5 * SCALING + cooling` in `RECIPROCAL_SHIFT` fixed-point.
///
/// Negative cooling is clamped to zero.
#[inline]
pub fn reciprocal_for(cooling: i32) -> i32 {
    let divisor = 5 * SCALING + cooling.max(0);
    (1 << (RECIPROCAL_SHIFT + SCALING_SHIFT)) / divisor
}

/// Geometry of one filter pass, computed once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stencil {
    /// Number of destination pixels written.
    pub end: usize,
    pub width: usize,
    pub reciprocal: i32,
}

impl Stencil {
    /// Returns `None` when nothing can be written: zero width, or a source
    /// too short to hold two rows below the first output pixel.
    pub fn new(src_len: usize, dst_len: usize, width: usize, reciprocal: i32) -> Option<Self> {
        if width == 0 {
            return None;
        }
        let end = src_len.checked_sub(2 * width)?.min(dst_len);
        (end > 0).then_some(Self {
            end,
            width,
            reciprocal,
        })
    }
}

/// The five source windows read by the filter, each `end` samples long.
pub(crate) struct Taps<'a> {
    pub here: &'a [i32],
    pub below: &'a [i32],
    pub below_left: &'a [i32],
    pub below_right: &'a [i32],
    pub two_below: &'a [i32],
}

impl<'a> Taps<'a> {
    /// Slice the windows up front so the loops run without index checks.
    #[inline]
    pub fn new(src: &'a [i32], st: &Stencil) -> Self {
        let (w, end) = (st.width, st.end);
        Self {
            here: &src[..end],
            below: &src[w..w + end],
            below_left: &src[w - 1..w - 1 + end],
            below_right: &src[w + 1..w + 1 + end],
            two_below: &src[2 * w..2 * w + end],
        }
    }

    #[inline(always)]
    pub fn pixel(&self, i: usize, reciprocal: i32) -> i32 {
        let sum = self.here[i]
            .wrapping_add(self.below[i])
            .wrapping_add(self.below_left[i])
            .wrapping_add(self.below_right[i])
            .wrapping_add(self.two_below[i]);
        sum.wrapping_mul(reciprocal) >> RECIPROCAL_SHIFT
    }
}

/// Which back-ends the caller is willing to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendPreference {
    pub gpu: bool,
    pub simd: bool,
}

impl Default for BackendPreference {
    fn default() -> Self {
        Self {
            gpu: false,
            simd: true,
        }
    }
}

/// Tagged compute back-end. The hot loop dispatches on the tag once per
/// frame, not per pixel.
#[derive(Debug)]
pub enum ConvolutionBackend {
    Scalar,
    Lanes,
    #[cfg(feature = "gpu")]
    Gpu(Box<gpu::GpuConvolver>),
}

impl ConvolutionBackend {
    /// Probe capabilities in order accelerator, lanes, scalar.
    pub fn select(pref: BackendPreference) -> Self {
        if pref.gpu {
            if let Some(gpu) = Self::try_gpu(pref.simd) {
                return gpu;
            }
        }
        let backend = Self::select_cpu(pref.simd);
        tracing::info!(backend = backend.name(), "convolution back-end selected");
        backend
    }

    #[cfg(feature = "gpu")]
    fn try_gpu(simd: bool) -> Option<Self> {
        match gpu::GpuConvolver::probe(simd) {
            Ok(gpu) => {
                tracing::info!(adapter = %gpu.adapter_name(), "convolution back-end: gpu");
                Some(Self::Gpu(Box::new(gpu)))
            }
            Err(err) => {
                tracing::info!(error = %err, "gpu not available, falling back to cpu");
                None
            }
        }
    }

    #[cfg(not(feature = "gpu"))]
    fn try_gpu(_simd: bool) -> Option<Self> {
        tracing::info!("gpu requested but built without the `gpu` feature");
        None
    }

    /// Best CPU back-end for the current target.
    pub fn select_cpu(simd: bool) -> Self {
        if simd && lanes::is_available() {
            Self::Lanes
        } else {
            Self::Scalar
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar => "Scalar",
            Self::Lanes => "SIMD",
            #[cfg(feature = "gpu")]
            Self::Gpu(_) => "GPU",
        }
    }

    /// Run one pass. A failing accelerator demotes this back-end to the CPU
    /// permanently and the pass is recomputed there.
    pub fn convolve(&mut self, src: &[i32], dst: &mut [i32], st: &Stencil) {
        match self {
            Self::Scalar => scalar::convolve(src, dst, st),
            Self::Lanes => lanes::convolve(src, dst, st),
            #[cfg(feature = "gpu")]
            Self::Gpu(gpu) => {
                if let Err(err) = gpu.convolve(src, dst, st) {
                    let fallback = Self::select_cpu(gpu.simd_fallback());
                    tracing::warn!(
                        error = %err,
                        fallback = fallback.name(),
                        "gpu convolution failed; disabling gpu for this run"
                    );
                    *self = fallback;
                    self.convolve(src, dst, st);
                }
            }
        }
    }
}

/// The fire filter: cooling state plus the selected back-end.
#[derive(Debug)]
pub struct ConvolveAndRise {
    cooling: i32,
    reciprocal: i32,
    backend: ConvolutionBackend,
}

impl ConvolveAndRise {
    pub fn new(cooling: i32, backend: ConvolutionBackend) -> Self {
        let mut effect = Self {
            cooling: FILTER_INITIAL_COOLING,
            reciprocal: reciprocal_for(FILTER_INITIAL_COOLING),
            backend,
        };
        effect.set_cooling(cooling);
        effect
    }

    #[inline]
    pub fn cooling(&self) -> i32 {
        self.cooling
    }

    /// Negative values are ignored and the previous cooling kept.
    pub fn set_cooling(&mut self, cooling: i32) {
        if cooling < 0 {
            return;
        }
        self.cooling = cooling;
        self.reciprocal = reciprocal_for(cooling);
    }

    pub fn inc_cooling(&mut self, delta: i32) {
        self.set_cooling(self.cooling.saturating_add(delta));
    }

    #[inline]
    pub fn reciprocal(&self) -> i32 {
        self.reciprocal
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Diffuse `source` into `dest`. Surfaces too small for the stencil are
    /// left untouched.
    pub fn draw(&mut self, source: &FixedSurface, dest: &mut FixedSurface) {
        let Some(st) = Stencil::new(
            source.data().len(),
            dest.data().len(),
            source.width(),
            self.reciprocal,
        ) else {
            return;
        };
        self.backend.convolve(source.data(), dest.data_mut(), &st);
    }
}
