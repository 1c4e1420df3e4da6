//! Discrete Gaussian sampling over Z.
//!
//! Provides the sampler used for every secret draw in the scheme: the
//! ideal generator, the re-randomization bases, the additive mask, and
//! fresh encodings. The RNG is always passed explicitly so that a whole
//! generation run is reproducible from a single seed.

use rand::Rng;
use rug::{Float, Integer};

/// Conversion between the two Gaussian density conventions.
///
/// The scheme is specified with respect to `exp(-π·x²/σ²)` while the
/// sampler draws proportionally to `exp(-x²/(2s²))`, so widths are scaled
/// by `1/sqrt(2π)` at every sampler construction site.
pub const S_TO_SIGMA: f64 = 0.398_942_280_401_432_7;

/// Discrete Gaussian sampler over Z with standard deviation σ.
///
/// Uses rejection sampling with a 6σ tailcut. The sampler itself is
/// stateless; randomness comes from the RNG handle passed to each call.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GaussianSampler {
    /// Standard deviation σ.
    sigma: f64,
    /// Tailcut: samples beyond this many integers from 0 are rejected.
    tailcut: i64,
}

impl GaussianSampler {
    /// Create a sampler with the given standard deviation.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            tailcut: (sigma * 6.0).ceil() as i64,
        }
    }

    /// The standard deviation σ.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Sample a single value from the discrete Gaussian D_σ.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        let sigma_sq_2 = 2.0 * self.sigma * self.sigma;

        loop {
            let x = rng.gen_range(-self.tailcut..=self.tailcut);
            // Square in floating point: at re-randomization widths the
            // tailcut exceeds sqrt(i64::MAX), so x * x would overflow.
            let xf = x as f64;
            let prob = (-(xf * xf) / sigma_sq_2).exp();

            let u: f64 = rng.gen();
            if u < prob {
                return x;
            }
        }
    }

    /// Sample a vector of Gaussian values.
    pub fn sample_vec<R: Rng>(&self, len: usize, rng: &mut R) -> Vec<i64> {
        (0..len).map(|_| self.sample(rng)).collect()
    }
}

/// Sample from a discrete Gaussian whose width exceeds the i64 range.
///
/// Used for the additive masking element, whose width is sqrt(q) with q
/// hundreds of bits wide. Draws a continuous Gaussian via Box–Muller and
/// rounds the scaled value to the nearest integer; the loss of precision
/// in the low bits is statistical only and does not affect correctness.
pub fn sample_wide<R: Rng>(sigma: &Float, rng: &mut R) -> Integer {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

    let val = Float::with_val(sigma.prec(), z) * sigma;
    val.to_integer().unwrap_or_default()
}
