//! Scalar back-end, unrolled 4-wide.

use super::{Stencil, Taps};

pub fn convolve(src: &[i32], dst: &mut [i32], st: &Stencil) {
    let taps = Taps::new(src, st);
    let recip = st.reciprocal;
    let dst = &mut dst[..st.end];

    let mut blocks = dst.chunks_exact_mut(4);
    let mut i = 0;
    for block in &mut blocks {
        block[0] = taps.pixel(i, recip);
        block[1] = taps.pixel(i + 1, recip);
        block[2] = taps.pixel(i + 2, recip);
        block[3] = taps.pixel(i + 3, recip);
        i += 4;
    }
    for out in blocks.into_remainder() {
        *out = taps.pixel(i, recip);
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convolution::RECIPROCAL_SHIFT;

    #[test]
    fn matches_hand_computed_pixel() {
        // width 3, rows: [1 2 3] [4 5 6] [7 8 9]
        let src: Vec<i32> = (1..=9).collect();
        let mut dst = vec![0; 3];
        let st = Stencil::new(src.len(), dst.len(), 3, 1 << RECIPROCAL_SHIFT).unwrap();
        convolve(&src, &mut dst, &st);
        // i=0: 1 + 4 + src[2]=3 + 5 + 7
        assert_eq!(dst[0], 1 + 4 + 3 + 5 + 7);
        // i=1: 2 + 5 + 4 + 6 + 8
        assert_eq!(dst[1], 2 + 5 + 4 + 6 + 8);
        // i=2: 3 + 6 + 5 + 7 + 9
        assert_eq!(dst[2], 3 + 6 + 5 + 7 + 9);
    }

    #[test]
    fn only_end_pixels_written() {
        let src = vec![256; 20];
        let mut dst = vec![-1; 20];
        let st = Stencil::new(src.len(), dst.len(), 4, 1 << RECIPROCAL_SHIFT).unwrap();
        convolve(&src, &mut dst, &st);
        assert!(dst[..12].iter().all(|&v| v == 5 * 256));
        assert!(dst[12..].iter().all(|&v| v == -1));
    }

    #[test]
    fn deterministic() {
        let src: Vec<i32> = (0..64).map(|i| (i * 977) % 65_000).collect();
        let st = Stencil::new(64, 64, 8, 3276).unwrap();
        let mut a = vec![0; 64];
        let mut b = vec![0; 64];
        convolve(&src, &mut a, &st);
        convolve(&src, &mut b, &st);
        assert_eq!(a, b);
    }
}
