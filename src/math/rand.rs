//! Uniform sampling of arbitrary-precision integers.

use rand::Rng;
use rug::Integer;

/// Sample a uniformly random integer in `[0, bound)`.
///
/// Draws `bound.significant_bits()` random bits and rejects values at or
/// above the bound, so the result is exactly uniform. The expected number
/// of draws is below two.
///
/// # Panics
///
/// Panics if `bound` is not positive.
pub fn uniform_below<R: Rng>(bound: &Integer, rng: &mut R) -> Integer {
    assert!(bound.cmp0() == std::cmp::Ordering::Greater, "bound must be positive");

    let bits = bound.significant_bits();
    let chunks = (bits + 31) / 32;

    loop {
        let mut v = Integer::new();
        for _ in 0..chunks {
            v <<= 32;
            v += rng.next_u32();
        }
        v >>= chunks * 32 - bits;

        if &v < bound {
            return v;
        }
    }
}
