//! Xorshift64 pseudo-random source for flicker effects.
//!
//! Not cryptographic. Cheap enough to call once per pixel of the seed row.

// ---------------------------------------------------------------------------
// Xorshift64 RNG
// ---------------------------------------------------------------------------

/// Deterministic xorshift64 PRNG (shifts 21, 35, 4).
#[derive(Debug, Clone)]
pub struct FastRandom {
    state: u64,
}

impl FastRandom {
    /// Create a generator. A zero seed would lock the sequence at zero, so it
    /// is replaced by one.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Seed from the wall clock.
    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);
        Self::new(nanos)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 21;
        x ^= x >> 35;
        x ^= x << 4;
        self.state = x;
        x
    }

    /// Fair coin from the low bit.
    #[inline]
    pub fn next_bool(&mut self) -> bool {
        self.next_u64() & 1 == 0
    }
}

impl Default for FastRandom {
    fn default() -> Self {
        Self::from_time()
    }
}
