//! Data-parallel back-end.
//!
//! Works on fixed `[i32; LANES]` blocks so the compiler can keep each block
//! in one vector register; the remainder falls back to the scalar formula.

use super::{RECIPROCAL_SHIFT, Stencil, Taps};

/// Lanes per block: one 256-bit register with AVX2, else 128-bit.
#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
pub const LANES: usize = 8;
#[cfg(not(all(target_arch = "x86_64", target_feature = "avx2")))]
pub const LANES: usize = 4;

/// Whether the target has vector integer units worth using.
pub fn is_available() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        std::arch::is_x86_feature_detected!("sse2")
    }
    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("neon")
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

#[inline(always)]
fn load(s: &[i32], base: usize) -> [i32; LANES] {
    let mut v = [0; LANES];
    v.copy_from_slice(&s[base..base + LANES]);
    v
}

pub fn convolve(src: &[i32], dst: &mut [i32], st: &Stencil) {
    let taps = Taps::new(src, st);
    let recip = st.reciprocal;
    let dst = &mut dst[..st.end];

    let mut blocks = dst.chunks_exact_mut(LANES);
    let mut base = 0;
    for block in &mut blocks {
        let a = load(taps.here, base);
        let b = load(taps.below, base);
        let c = load(taps.below_left, base);
        let d = load(taps.below_right, base);
        let e = load(taps.two_below, base);
        for l in 0..LANES {
            let sum = a[l]
                .wrapping_add(b[l])
                .wrapping_add(c[l])
                .wrapping_add(d[l])
                .wrapping_add(e[l]);
            block[l] = sum.wrapping_mul(recip) >> RECIPROCAL_SHIFT;
        }
        base += LANES;
    }
    for out in blocks.into_remainder() {
        *out = taps.pixel(base, recip);
        base += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convolution::{reciprocal_for, scalar};

    fn both(src: &[i32], width: usize, cooling: i32) -> (Vec<i32>, Vec<i32>) {
        let mut a = vec![0; src.len()];
        let mut b = vec![0; src.len()];
        if let Some(st) = Stencil::new(src.len(), src.len(), width, reciprocal_for(cooling)) {
            scalar::convolve(src, &mut a, &st);
            convolve(src, &mut b, &st);
        }
        (a, b)
    }

    #[test]
    fn matches_scalar_with_tail() {
        let src: Vec<i32> = (0..(13 * 7)).map(|i| (i * 7919) % 65_280).collect();
        let (a, b) = both(&src, 13, 12);
        assert_eq!(a, b);
    }

    #[test]
    fn narrower_than_one_block() {
        let src = vec![1000; 9];
        let (a, b) = both(&src, 3, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_source() {
        let (a, b) = both(&[], 4, 0);
        assert!(a.is_empty() && b.is_empty());
    }
}
