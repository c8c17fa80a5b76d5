//! Intensity-to-color lookup tables.
//!
//! A palette maps the integer part of a fixed-point intensity (masked to
//! `0..=255`) to an opaque color. The built-in tables are generated at
//! startup, mostly from HSB ramps.

use crate::surface::{FixedSurface, SCALING_SHIFT};

/// Entries per palette. Must stay a power of two for the index mask.
pub const PALETTE_SIZE: usize = 256;

/// RGBA color packed as `r << 24 | g << 16 | b << 8 | a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | 255)
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// HSB to RGB with the classic AWT channel rounding. `hue` wraps.
    pub fn from_hsb(hue: f32, saturation: f32, brightness: f32) -> Self {
        let channel = |v: f32| (v * 255.0 + 0.5) as u8;
        if saturation == 0.0 {
            let v = channel(brightness);
            return Self::rgb(v, v, v);
        }
        let h = (hue - hue.floor()) * 6.0;
        let f = h - h.floor();
        let p = brightness * (1.0 - saturation);
        let q = brightness * (1.0 - saturation * f);
        let t = brightness * (1.0 - saturation * (1.0 - f));
        let (r, g, b) = match h as u32 {
            0 => (brightness, t, p),
            1 => (q, brightness, p),
            2 => (p, brightness, t),
            3 => (p, q, brightness),
            4 => (t, p, brightness),
            _ => (brightness, p, q),
        };
        Self::rgb(channel(r), channel(g), channel(b))
    }
}

/// Device-presentable pixel target the render loop writes into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<PackedRgba>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![PackedRgba::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[PackedRgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [PackedRgba] {
        &mut self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> PackedRgba {
        if x >= self.width {
            return PackedRgba::BLACK;
        }
        self.pixels
            .get(y * self.width + x)
            .copied()
            .unwrap_or(PackedRgba::BLACK)
    }

    /// Reallocate for a new size, cleared to black.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, PackedRgba::BLACK);
    }
}

/// A named 256-entry color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    name: String,
    lut: Box<[PackedRgba; PALETTE_SIZE]>,
}

impl Palette {
    pub fn new(name: impl Into<String>, lut: [PackedRgba; PALETTE_SIZE]) -> Self {
        Self {
            name: name.into(),
            lut: Box::new(lut),
        }
    }

    fn from_fn(name: &str, f: impl Fn(usize) -> PackedRgba) -> Self {
        Self::new(name, std::array::from_fn(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn lookup(&self, intensity: i32) -> PackedRgba {
        self.lut[((intensity >> SCALING_SHIFT) as usize) & (PALETTE_SIZE - 1)]
    }

    /// Map the drawable area of `source` into `dest`; extra rows are not
    /// shown.
    pub fn apply(&self, source: &FixedSurface, dest: &mut [PackedRgba]) {
        let n = source.visible_len().min(dest.len());
        for (out, &v) in dest[..n].iter_mut().zip(&source.data()[..n]) {
            *out = self.lookup(v);
        }
    }

    // -----------------------------------------------------------------------
    // Built-ins
    // -----------------------------------------------------------------------

    /// Red through orange and yellow to white.
    pub fn fire() -> Self {
        Self::from_fn("fire", |i| {
            let n = i as f32 / 256.0;
            PackedRgba::from_hsb(
                n * (160.0 / 360.0),
                1.0 - (2.0 * n).min(1.0),
                (5.0 * n).min(1.0),
            )
        })
    }

    pub fn evil() -> Self {
        Self::from_fn("evil", |i| {
            let step = ((i % 64) * 4) as u8;
            match i / 64 {
                0 => PackedRgba::rgb(step, 0, 0),
                1 => PackedRgba::rgb(255, step, 0),
                2 => PackedRgba::rgb(255, 255, step),
                _ => PackedRgba::WHITE,
            }
        })
    }

    pub fn rockbox() -> Self {
        const N: usize = 32;
        Self::from_fn("rockbox", |idx| {
            let i = idx % N;
            let c = |v: usize| v.min(255) as u8;
            match idx / N {
                0 => PackedRgba::rgb(0, 0, c(2 * N + 2 * i)),
                1 => PackedRgba::rgb(c(8 * i), 0, c(4 * N + 2 * i)),
                2 => PackedRgba::rgb(255, c(8 * i), 0),
                3 => PackedRgba::rgb(255, 255, c(4 * i)),
                4 => PackedRgba::rgb(255, 255, c(2 * N + 4 * i)),
                5 => PackedRgba::rgb(255, 255, c(4 * N + 4 * i)),
                6 => PackedRgba::rgb(255, 255, c(5 * N + i)),
                _ => PackedRgba::rgb(255, 255, c(6 * N + i)),
            }
        })
    }

    pub fn blue_fire() -> Self {
        Self::from_fn("blue fire", |i| {
            let n = i as f32 / 256.0;
            PackedRgba::from_hsb(
                0.55 + n * 0.15,
                1.0 - (2.0 * n).min(1.0),
                (4.0 * n).min(1.0),
            )
        })
    }

    pub fn matrix() -> Self {
        Self::from_fn("matrix", |i| {
            let n = i as f32 / 256.0;
            PackedRgba::from_hsb(1.0 / 3.0, 1.0 - 0.5 * n, n)
        })
    }

    pub fn purple() -> Self {
        Self::from_fn("purple", |i| {
            let n = i as f32 / 256.0;
            PackedRgba::from_hsb(
                0.8 - n * 0.1,
                1.0 - (1.5 * n).min(1.0),
                (3.0 * n).min(1.0),
            )
        })
    }

    pub fn grayscale() -> Self {
        Self::from_fn("grayscale", |i| {
            let v = i as u8;
            PackedRgba::rgb(v, v, v)
        })
    }

    /// Every built-in, in cycling order.
    pub fn builtins() -> Vec<Self> {
        vec![
            Self::fire(),
            Self::evil(),
            Self::rockbox(),
            Self::blue_fire(),
            Self::matrix(),
            Self::purple(),
            Self::grayscale(),
        ]
    }
}
