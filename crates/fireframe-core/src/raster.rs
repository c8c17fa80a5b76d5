//! Clipped integer line drawing.
//!
//! Segments are first clipped to the viewport with Cohen-Sutherland outcodes,
//! then scan-converted with Bresenham's difference-of-errors stepping. Both
//! endpoints are drawn, so a zero-length segment plots one pixel.
//!
//! The viewport spans the full width and a vertical band `[y_min, y_max]`.
//! By default the band excludes the first and last rows of the surface:
//! those are guard rows the fire filter reads as scratch.

use crate::material::PixelSource;
use crate::surface::FixedSurface;

// Outcode bits.
const LEFT: u8 = 1;
const RIGHT: u8 = 1 << 1;
const BELOW: u8 = 1 << 2;
const ABOVE: u8 = 1 << 3;

/// Receives projected segments in screen coordinates.
pub trait LineSink {
    fn line(&mut self, from: (i32, i32), to: (i32, i32), pixels: &mut impl PixelSource);
}

/// Inclusive clip rectangle `[0, width - 1] x [y_min, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl Viewport {
    /// Full width, rows `1..=height - 2`.
    pub fn guarded(width: usize, height: usize) -> Self {
        Self {
            width: width as i64,
            y_min: 1,
            y_max: height as i64 - 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.y_max < self.y_min
    }

    fn outcode(&self, x: i64, y: i64) -> u8 {
        let mut code = 0;
        if x < 0 {
            code |= LEFT;
        } else if x >= self.width {
            code |= RIGHT;
        }
        if y < self.y_min {
            code |= ABOVE;
        } else if y > self.y_max {
            code |= BELOW;
        }
        code
    }

    /// Clip a segment to the viewport. `None` if nothing of it is visible.
    pub fn clip(&self, from: (i64, i64), to: (i64, i64)) -> Option<((i64, i64), (i64, i64))> {
        if self.is_empty() {
            return None;
        }
        let ((mut x0, mut y0), (mut x1, mut y1)) = (from, to);
        let mut code0 = self.outcode(x0, y0);
        let mut code1 = self.outcode(x1, y1);

        loop {
            if code0 | code1 == 0 {
                return Some(((x0, y0), (x1, y1)));
            }
            if code0 & code1 != 0 {
                return None;
            }
            let code = if code0 != 0 { code0 } else { code1 };
            // Widened so far-off projected endpoints cannot overflow.
            let along = |base: i64, d: i64, num: i64, den: i64| {
                (i128::from(base) + i128::from(d) * i128::from(num) / i128::from(den)) as i64
            };
            let (dx, dy) = (x1 - x0, y1 - y0);
            let (x, y) = if code & ABOVE != 0 {
                (along(x0, dx, self.y_min - y0, dy), self.y_min)
            } else if code & BELOW != 0 {
                (along(x0, dx, self.y_max - y0, dy), self.y_max)
            } else if code & RIGHT != 0 {
                (self.width - 1, along(y0, dy, self.width - 1 - x0, dx))
            } else {
                (0, along(y0, dy, -x0, dx))
            };
            if code == code0 {
                (x0, y0) = (x, y);
                code0 = self.outcode(x0, y0);
            } else {
                (x1, y1) = (x, y);
                code1 = self.outcode(x1, y1);
            }
        }
    }
}

/// Visit every pixel from `from` to `to` inclusive.
pub fn bresenham(from: (i64, i64), to: (i64, i64), mut plot: impl FnMut(i64, i64)) {
    let ((mut x, mut y), (x1, y1)) = (from, to);
    let dx = (x1 - x).abs();
    let dy = (y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    loop {
        plot(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draws lines into a [`FixedSurface`].
pub struct LineRasterizer<'a> {
    surface: &'a mut FixedSurface,
    viewport: Viewport,
}

impl<'a> LineRasterizer<'a> {
    /// Clip band leaves the first and last drawable rows free.
    pub fn new(surface: &'a mut FixedSurface) -> Self {
        let viewport = Viewport::guarded(surface.width(), surface.height());
        Self { surface, viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn draw_line(&mut self, from: (i64, i64), to: (i64, i64), pixels: &mut impl PixelSource) {
        let Some((a, b)) = self.viewport.clip(from, to) else {
            return;
        };
        let width = self.surface.width();
        let surface = &mut *self.surface;
        bresenham(a, b, |x, y| {
            // Clipped coordinates are non-negative and inside the band.
            surface.set(y as usize * width + x as usize, pixels.next_pixel());
        });
    }
}

impl LineSink for LineRasterizer<'_> {
    fn line(&mut self, from: (i32, i32), to: (i32, i32), pixels: &mut impl PixelSource) {
        self.draw_line(
            (i64::from(from.0), i64::from(from.1)),
            (i64::from(to.0), i64::from(to.1)),
            pixels,
        );
    }
}
