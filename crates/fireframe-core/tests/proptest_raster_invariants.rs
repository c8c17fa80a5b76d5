//! Property tests for the clipped line rasterizer.
//!
//! 1. Nothing is ever written outside the viewport band.
//! 2. A segment fully inside the band draws `max(|dx|, |dy|) + 1` pixels.
//! 3. Both endpoints of an inside segment are drawn.
//! 4. Clipping never panics, whatever the input coordinates.

use fireframe_core::raster::{LineRasterizer, Viewport, bresenham};
use fireframe_core::surface::FixedSurface;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn dims() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=64, 1usize..=48)
}

fn coord() -> impl Strategy<Value = i64> {
    -200i64..=200
}

fn lit(s: &FixedSurface) -> usize {
    s.data().iter().filter(|&&v| v != 0).count()
}

proptest! {
    #[test]
    fn never_writes_outside_band(
        (w, h) in dims(),
        x0 in coord(), y0 in coord(), x1 in coord(), y1 in coord(),
    ) {
        let mut s = FixedSurface::new(w, h, 1);
        LineRasterizer::new(&mut s).draw_line((x0, y0), (x1, y1), &mut 1);
        let vp = Viewport::guarded(w, h);
        for (i, &v) in s.data().iter().enumerate() {
            if v != 0 {
                let (x, y) = ((i % w) as i64, (i / w) as i64);
                prop_assert!(x < vp.width && y >= vp.y_min && y <= vp.y_max, "({x},{y}) lit");
            }
        }
    }

    #[test]
    fn inside_segment_pixel_count(
        (w, h) in (3usize..=64, 3usize..=48),
        seed in any::<[u16; 4]>(),
    ) {
        let vp = Viewport::guarded(w, h);
        let span = (vp.y_max - vp.y_min + 1) as u16;
        let x0 = i64::from(seed[0] % w as u16);
        let x1 = i64::from(seed[1] % w as u16);
        let y0 = vp.y_min + i64::from(seed[2] % span);
        let y1 = vp.y_min + i64::from(seed[3] % span);
        let mut s = FixedSurface::new(w, h, 0);
        LineRasterizer::new(&mut s).draw_line((x0, y0), (x1, y1), &mut 1);
        let expected = (x1 - x0).abs().max((y1 - y0).abs()) as usize + 1;
        prop_assert_eq!(lit(&s), expected);
        prop_assert_eq!(s.get(y0 as usize * w + x0 as usize), Some(1));
        prop_assert_eq!(s.get(y1 as usize * w + x1 as usize), Some(1));
    }

    #[test]
    fn clip_result_lies_inside(
        x0 in any::<i32>(), y0 in any::<i32>(), x1 in any::<i32>(), y1 in any::<i32>(),
    ) {
        let vp = Viewport { width: 100, y_min: 1, y_max: 60 };
        let from = (i64::from(x0), i64::from(y0));
        let to = (i64::from(x1), i64::from(y1));
        if let Some(((ax, ay), (bx, by))) = vp.clip(from, to) {
            for (x, y) in [(ax, ay), (bx, by)] {
                prop_assert!((0..100).contains(&x) && (1..=60).contains(&y));
            }
        }
    }

    #[test]
    fn bresenham_steps_are_unit(x0 in -50i64..50, y0 in -50i64..50, x1 in -50i64..50, y1 in -50i64..50) {
        let mut pts = Vec::new();
        bresenham((x0, y0), (x1, y1), |x, y| pts.push((x, y)));
        prop_assert_eq!(pts.first().copied(), Some((x0, y0)));
        prop_assert_eq!(pts.last().copied(), Some((x1, y1)));
        for pair in pts.windows(2) {
            prop_assert!((pair[1].0 - pair[0].0).abs() <= 1);
            prop_assert!((pair[1].1 - pair[0].1).abs() <= 1);
        }
    }
}

#[test]
fn known_cases() {
    let draw = |from, to| {
        let mut s = FixedSurface::new(20, 12, 0);
        LineRasterizer::new(&mut s).draw_line(from, to, &mut 1);
        lit(&s)
    };
    assert_eq!(draw((2, 5), (10, 5)), 9);
    assert_eq!(draw((30, 5), (40, 9)), 0);
    assert_eq!(draw((15, 3), (25, 3)), 5);
    assert_eq!(draw((6, 6), (6, 6)), 1);
    assert_eq!(draw((19, 4), (19, 4)), 1);
}
