//! Parameter derivation for the graded encoding scheme.
//!
//! [`Params::new`] turns the caller-facing knobs (security level λ,
//! multilinearity degree κ, re-randomization mask, flags) into the full
//! instance geometry: ring dimension, modulus, the four Gaussian widths,
//! and the quality bounds the generation loops enforce. The formula set
//! is closed-form; the only search is for the modulus, taken as the least
//! probable prime ≡ 1 (mod 2n) above the size the noise analysis needs.

use crate::error::{config_err, Result};
use rug::integer::IsPrime;
use rug::Integer;
use std::f64::consts::{E, PI};

/// Maximum supported multilinearity degree.
pub const MAX_KAPPA: usize = 64;

/// Optional behavior switches for instance generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Flags {
    /// Require the ideal ⟨g⟩ to have probable-prime norm. Expensive; off
    /// by default, in which case g is only screened for small prime
    /// factors.
    pub prime_g: bool,

    /// Use the wider re-randomization width that makes the graded DDH
    /// assumption plausibly hard, rather than the correctness-only width.
    pub gddh_hard: bool,

    /// Verify the least-singular-value bound on the stacked
    /// re-randomization basis. Expensive; when off, a warning is logged
    /// once per generated basis.
    pub check_basis: bool,

    /// Cap for every rejection-sampling loop. `None` retries forever.
    pub max_attempts: Option<u64>,
}

/// Public parameters of a graded encoding instance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Params {
    /// Security parameter λ.
    pub lambda: usize,
    /// Multilinearity degree κ.
    pub kappa: usize,
    /// Bit i set means levels i+1 gets a re-randomization basis. Only
    /// bit 0 is supported.
    pub rerand_mask: u64,
    /// Generation switches.
    pub flags: Flags,

    /// Ring dimension n (power of two).
    pub n: usize,
    /// Modulus q, probable prime ≡ 1 (mod 2n).
    pub q: Integer,
    /// Width of the ideal generator g.
    pub sigma: f64,
    /// Width σ' of the re-randomization basis elements.
    pub sigma_p: f64,
    /// Width σ* of the re-randomization multipliers.
    pub sigma_s: f64,
    /// Upper bound on ‖g⁻¹‖ accepted for the ideal generator.
    pub ell_g: f64,
    /// Lower bound on the least singular value of the stacked basis.
    pub ell_b: f64,
    /// Zero-test threshold exponent: values below q^(1-ξ) test as zero.
    pub xi: f64,
    /// Extraction bits taken from the top of each coefficient.
    pub ell: usize,

    /// Precomputed q^(1-ξ).
    zt_bound: Integer,
}

fn ceil_log2(x: usize) -> usize {
    x.next_power_of_two().trailing_zeros() as usize
}

impl Params {
    /// Derive instance parameters.
    ///
    /// Fails on λ = 0, κ = 0, κ > [`MAX_KAPPA`], or a re-randomization
    /// mask naming any level other than the lowest.
    pub fn new(lambda: usize, kappa: usize, rerand_mask: u64, flags: Flags) -> Result<Params> {
        Self::validate(lambda, kappa, rerand_mask)?;

        let n = (lambda * kappa * ceil_log2(lambda)).max(64).next_power_of_two();
        let nf = n as f64;

        // Width base sqrt(e·ln(8n)/π), shared by the smoothing-style
        // width formulas below.
        let base = (E * (8.0 * nf).ln() / PI).sqrt();

        let sigma = 4.0 * PI * nf * base;
        let ell_g = 4.0 * (2.0 * PI).sqrt() / (sigma * nf.sqrt());
        let sigma_p = 2.0 * nf.powf(1.5) * sigma * base;
        let sigma_s = if flags.gddh_hard {
            nf.powf(1.5) * sigma_p * (8.0 * E * (8.0 * nf).ln() / PI).sqrt()
        } else {
            nf.sqrt() * sigma_p
        };
        let ell_b = 0.2 * nf.powf(0.25) * sigma_p;
        let xi = 0.25;
        let ell = ceil_log2(lambda) + 3;

        // Modulus size from the worst-case zero-test value. Level-1
        // numerators are bounded by B_1 = 4n^(7/2)·σ·σ*·σ', a coset-
        // reduced cleartext times a re-randomized encoding of one; a
        // κ-fold product stacks to B_κ = n^((κ-1)/2)·B_1^κ; the zero test
        // pays a further ‖g⁻¹‖ ≤ ℓ_g, the mask h of width sqrt(q), and n²
        // of convolution slack, and must clear q^(1-ξ) = q^(3/4) with
        // margin left for the extraction bit boundary.
        let log2_b1 = (4.0 * nf.powf(3.5) * sigma * sigma_s * sigma_p).log2();
        let log2_bk = (kappa as f64 - 1.0) / 2.0 * nf.log2() + kappa as f64 * log2_b1;
        let log2_q = 4.0 * (log2_bk + ell_g.log2() + 2.0 * nf.log2() + 10.0);

        let q = Self::find_modulus(n, log2_q.ceil() as u32);
        let q_cubed = Integer::from(&q * &q) * &q;
        let zt_bound = q_cubed.root(4);

        Ok(Params {
            lambda,
            kappa,
            rerand_mask,
            flags,
            n,
            q,
            sigma,
            sigma_p,
            sigma_s,
            ell_g,
            ell_b,
            xi,
            ell,
            zt_bound,
        })
    }

    fn validate(lambda: usize, kappa: usize, rerand_mask: u64) -> Result<()> {
        if lambda == 0 {
            return Err(config_err!("security parameter lambda must be positive"));
        }
        if kappa == 0 || kappa > MAX_KAPPA {
            return Err(config_err!(
                "multilinearity degree kappa must be in 1..={}, got {}",
                MAX_KAPPA,
                kappa
            ));
        }
        if rerand_mask >> 1 != 0 {
            return Err(config_err!(
                "re-randomization is only supported at the lowest level (mask 0b{:b})",
                rerand_mask
            ));
        }
        Ok(())
    }

    /// Least probable prime ≡ 1 (mod 2n) with at least `min_bits` bits.
    fn find_modulus(n: usize, min_bits: u32) -> Integer {
        let two_n = Integer::from(2 * n as u64);
        let mut k = (Integer::from(1) << min_bits) / &two_n + 1u32;

        loop {
            let q = Integer::from(&k * &two_n) + 1u32;
            if q.is_probably_prime(30) != IsPrime::No {
                return q;
            }
            k += 1;
        }
    }

    /// Zero-test threshold q^(1-ξ); centered coefficients below this
    /// magnitude count as zero.
    pub fn zt_bound(&self) -> &Integer {
        &self.zt_bound
    }

    /// Working precision for the float checks, 2λ bits.
    pub fn prec(&self) -> u32 {
        (2 * self.lambda).max(64) as u32
    }

    /// Whether level `level` carries a re-randomization basis.
    pub fn rerand_at(&self, level: usize) -> bool {
        level >= 1 && level <= 64 && self.rerand_mask >> (level - 1) & 1 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(Params::new(0, 2, 1, Flags::default()).is_err());
        assert!(Params::new(4, 0, 1, Flags::default()).is_err());
        assert!(Params::new(4, 65, 1, Flags::default()).is_err());
        assert!(Params::new(4, 2, 0b10, Flags::default()).is_err());
        assert!(Params::new(4, 2, 0b11, Flags::default()).is_err());
    }

    #[test]
    fn test_degree_boundaries() {
        // Degree 64 is the last accepted value. Deriving a degree-64
        // instance means searching for a many-thousand-bit modulus, so
        // only the validation step is exercised here.
        assert!(Params::validate(4, 64, 1).is_ok());
        assert!(Params::validate(4, 1, 1).is_ok());
        assert!(Params::validate(4, 65, 1).is_err());
    }

    #[test]
    fn test_small_instance_geometry() {
        let p = Params::new(4, 1, 1, Flags::default()).unwrap();

        assert_eq!(p.n, 64);
        assert_eq!(p.ell, 5);
        assert!(p.sigma > 0.0 && p.sigma_p > p.sigma && p.sigma_s > p.sigma_p);
        assert!(p.ell_g < 1.0);

        // q ≡ 1 (mod 2n), probable prime, above the zero-test threshold.
        assert_eq!(
            Integer::from(&p.q - 1u32) % Integer::from(2 * p.n as u64),
            0
        );
        assert!(p.q.is_probably_prime(30) != IsPrime::No);
        assert!(*p.zt_bound() < p.q);
        assert!(p.zt_bound().significant_bits() > p.q.significant_bits() / 2);
    }

    #[test]
    fn test_gddh_hard_widens_sigma_s() {
        let soft = Params::new(4, 1, 1, Flags::default()).unwrap();
        let hard = Params::new(4, 1, 1, Flags { gddh_hard: true, ..Flags::default() })
            .unwrap();
        assert!(hard.sigma_s > soft.sigma_s);
        assert!(hard.q > soft.q);
    }

    #[test]
    fn test_dimension_grows_with_degree() {
        let k1 = Params::new(4, 1, 1, Flags::default()).unwrap();
        let k4 = Params::new(4, 4, 1, Flags::default()).unwrap();
        assert!(k4.n >= k1.n);
        assert!(k4.q.significant_bits() > k1.q.significant_bits());
    }

    #[test]
    fn test_rerand_mask_lookup() {
        let p = Params::new(4, 2, 1, Flags::default()).unwrap();
        assert!(p.rerand_at(1));
        assert!(!p.rerand_at(2));
        assert!(!p.rerand_at(0));

        let quiet = Params::new(4, 2, 0, Flags::default()).unwrap();
        assert!(!quiet.rerand_at(1));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = Params::new(4, 2, 1, Flags::default()).unwrap();
        let b = Params::new(4, 2, 1, Flags::default()).unwrap();
        assert_eq!(a, b);
    }
}
