#![forbid(unsafe_code)]

//! Half-block presentation of the pixel target.
//!
//! Each terminal cell shows two vertically stacked pixels as `▀` with the
//! upper pixel as foreground and the lower as background. The pixel target
//! is sampled nearest-neighbor when its size differs from the cell grid.
//! The last terminal row carries the status line.

use std::io::{self, Write};

use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue, terminal};

use fireframe_core::{PackedRgba, PixelBuffer};

/// One terminal cell's colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfCell {
    pub top: PackedRgba,
    pub bottom: PackedRgba,
}

/// Pixel-target size for a terminal: full width, two pixels per row, one
/// row kept for status.
pub fn target_size(cols: u16, rows: u16) -> (usize, usize) {
    (usize::from(cols), usize::from(rows.saturating_sub(1)) * 2)
}

/// Sample `image` onto a `cols x rows` grid of half-block cells.
pub fn compose(image: &PixelBuffer, cols: usize, rows: usize) -> Vec<HalfCell> {
    let (w, h) = (image.width(), image.height());
    let px_rows = rows * 2;
    let mut cells = Vec::with_capacity(cols * rows);
    if w == 0 || h == 0 {
        cells.resize(cols * rows, HalfCell {
            top: PackedRgba::BLACK,
            bottom: PackedRgba::BLACK,
        });
        return cells;
    }
    let sample = |px: usize, py: usize| image.get(px * w / cols.max(1), py * h / px_rows.max(1));
    for row in 0..rows {
        for col in 0..cols {
            cells.push(HalfCell {
                top: sample(col, row * 2),
                bottom: sample(col, row * 2 + 1),
            });
        }
    }
    cells
}

fn color(c: PackedRgba) -> Color {
    Color::Rgb {
        r: c.r(),
        g: c.g(),
        b: c.b(),
    }
}

/// Write `cells` and the status line, emitting color changes only.
pub fn present(
    out: &mut impl Write,
    cells: &[HalfCell],
    cols: usize,
    status: &str,
) -> io::Result<()> {
    if cols == 0 {
        return Ok(());
    }
    let mut current: Option<HalfCell> = None;
    for (row, line) in cells.chunks(cols).enumerate() {
        queue!(out, cursor::MoveTo(0, row as u16))?;
        for &cell in line {
            if current.map(|c| c.top) != Some(cell.top) {
                queue!(out, SetForegroundColor(color(cell.top)))?;
            }
            if current.map(|c| c.bottom) != Some(cell.bottom) {
                queue!(out, SetBackgroundColor(color(cell.bottom)))?;
            }
            current = Some(cell);
            queue!(out, Print('▀'))?;
        }
    }
    let status_row = cells.len().div_ceil(cols) as u16;
    let status: String = status.chars().take(cols).collect();
    queue!(
        out,
        ResetColor,
        cursor::MoveTo(0, status_row),
        terminal::Clear(terminal::ClearType::CurrentLine),
        Print(status)
    )?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_reserves_status_row() {
        assert_eq!(target_size(80, 25), (80, 48));
        assert_eq!(target_size(10, 0), (10, 0));
    }

    #[test]
    fn compose_pairs_rows() {
        let mut img = PixelBuffer::new(1, 2);
        img.pixels_mut()[0] = PackedRgba::WHITE;
        let cells = compose(&img, 1, 1);
        assert_eq!(cells, vec![HalfCell {
            top: PackedRgba::WHITE,
            bottom: PackedRgba::BLACK,
        }]);
    }

    #[test]
    fn compose_scales_to_grid() {
        let mut img = PixelBuffer::new(4, 4);
        img.pixels_mut()[2] = PackedRgba::WHITE;
        let cells = compose(&img, 2, 1);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].top, PackedRgba::WHITE);
        assert_eq!(cells[0].top, PackedRgba::BLACK);
    }

    #[test]
    fn empty_image_is_black() {
        let cells = compose(&PixelBuffer::new(0, 0), 3, 2);
        assert_eq!(cells.len(), 6);
        assert!(cells.iter().all(|c| c.top == PackedRgba::BLACK));
    }

    #[test]
    fn present_writes_glyphs_and_status() {
        let cells = compose(&PixelBuffer::new(2, 2), 12, 1);
        let mut out = Vec::new();
        present(&mut out, &cells, 12, "fire | SIMD").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('▀').count(), 12);
        assert!(text.contains("fire | SIMD"));
        // Same colors throughout: one foreground change only.
        assert_eq!(text.matches("\x1b[38;2;").count(), 1);
    }
}
