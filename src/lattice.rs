//! Sampling over the ideal lattice ⟨g⟩ and coset reduction.
//!
//! Points of ⟨g⟩ are drawn in structured form g·m with m a discrete
//! Gaussian vector whose width is scaled so the product lands near the
//! requested width; the multiplier is kept alongside the point because
//! the basis sampler needs it for coprimality checks. Coset reduction
//! uses Babai round-off through the canonical embedding: divide by g
//! over C, round the rational coefficients, subtract the integral part.

use crate::math::embed::{embed, unembed};
use crate::math::{GaussianSampler, IntPoly};
use rand::Rng;
use rug::{Complex, Integer};
use zeroize::Zeroizing;

/// Discrete Gaussian sampler over the ideal lattice ⟨g⟩.
#[derive(Clone, Debug)]
pub struct IdealSampler {
    g: IntPoly,
    sampler: GaussianSampler,
}

impl IdealSampler {
    /// Sampler producing points of ⟨g⟩ of width roughly `sigma`.
    pub fn new(g: &IntPoly, sigma: f64) -> Self {
        let g_norm = g.norm(64).to_f64();
        Self {
            g: g.clone(),
            sampler: GaussianSampler::new(sigma / g_norm),
        }
    }

    /// Draw a (point, multiplier) pair with point = g · multiplier.
    pub fn sample_pair<R: Rng>(&self, rng: &mut R) -> (IntPoly, IntPoly) {
        let draw = Zeroizing::new(self.sampler.sample_vec(self.g.dimension(), rng));
        let m = IntPoly::from_i64(&draw);
        (self.g.mul(&m), m)
    }

    /// Draw from the coset 1 + ⟨g⟩.
    pub fn sample_plus_one<R: Rng>(&self, rng: &mut R) -> IntPoly {
        let (point, _) = self.sample_pair(rng);
        &point + &IntPoly::one(self.g.dimension())
    }
}

/// Babai round-off reduction of `c` modulo ⟨g⟩: returns c - g·⌊c/g⌉ with
/// the quotient computed in the canonical embedding.
///
/// `base_prec` is the caller's working precision; the division is done
/// with enough extra bits on top of it to absorb the operand magnitudes,
/// so arbitrarily large cleartext coefficients round correctly.
pub fn babai_reduce(c: &IntPoly, g: &IntPoly, base_prec: u32) -> IntPoly {
    let n = c.dimension();
    assert_eq!(n, g.dimension(), "dimension mismatch");

    let prec = base_prec
        + c.inf_norm().significant_bits()
        + g.inf_norm().significant_bits()
        + n.trailing_zeros()
        + 16;

    let ec = embed(c, prec);
    let eg = embed(g, prec);
    let quotient: Vec<Complex> = ec
        .into_iter()
        .zip(&eg)
        .map(|(x, y)| x / y)
        .collect();

    let rounded: Vec<Integer> = unembed(quotient)
        .into_iter()
        .map(|f| f.to_integer().unwrap_or_default())
        .collect();

    c - &g.mul(&IntPoly { coeffs: rounded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use rug::ops::RemRounding;

    fn g() -> IntPoly {
        IntPoly::from_i64(&[2, 1, 0, 0])
    }

    // For g = x + 2 over Z[x]/(x^4 + 1), membership in ⟨g⟩ is equivalent
    // to evaluating to 0 mod 17 at x = -2, since g(-2) = 0 and
    // (-2)^4 + 1 = 17 = N(g).
    fn eval_at_minus_two_mod_17(p: &IntPoly) -> Integer {
        let mut acc = Integer::new();
        let mut pow = Integer::from(1);
        for c in &p.coeffs {
            acc += Integer::from(c * &pow);
            pow *= -2;
        }
        acc.rem_euc(Integer::from(17))
    }

    #[test]
    fn test_babai_reduces_lattice_points_to_zero() {
        let m = IntPoly::from_i64(&[5, -3, 7, 2]);
        let c = g().mul(&m);
        assert!(babai_reduce(&c, &g(), 64).is_zero());
    }

    #[test]
    fn test_babai_recovers_short_offset() {
        // Coefficients of (x + 2)^(-1) all have magnitude below 1/2, so
        // round-off recovers a unit offset exactly.
        let m = IntPoly::from_i64(&[5, -3, 7, 2]);
        let c = &g().mul(&m) + &IntPoly::one(4);
        assert_eq!(babai_reduce(&c, &g(), 64), IntPoly::one(4));
    }

    #[test]
    fn test_babai_handles_huge_coefficients() {
        let big = Integer::from(1) << 133u32;
        let c = IntPoly::constant(big, 4);
        let r = babai_reduce(&c, &g(), 64);

        assert_eq!(
            eval_at_minus_two_mod_17(&r),
            eval_at_minus_two_mod_17(&c),
            "reduction left the coset"
        );
        assert!(r.inf_norm() < 100, "residue not short: {}", r.inf_norm());
    }

    #[test]
    fn test_sample_pair_structure() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let sampler = IdealSampler::new(&g(), 50.0);

        for _ in 0..20 {
            let (point, mult) = sampler.sample_pair(&mut rng);
            assert_eq!(point, g().mul(&mult));
            assert_eq!(eval_at_minus_two_mod_17(&point), 0);
        }
    }

    #[test]
    fn test_sample_plus_one_is_in_unit_coset() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let sampler = IdealSampler::new(&g(), 50.0);

        for _ in 0..20 {
            let a = sampler.sample_plus_one(&mut rng);
            assert_eq!(eval_at_minus_two_mod_17(&a), Integer::from(1));
        }
    }
}
