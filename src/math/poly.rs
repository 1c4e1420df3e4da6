//! Polynomial arithmetic over R = Z[x]/(x^n + 1) and R_q.
//!
//! Two representations, matching the scheme's data model:
//!
//! - [`IntPoly`]: integer coefficients in the coefficient domain. This is
//!   the cleartext representation, and the representation of all secret
//!   ring elements during key generation.
//! - [`ModPoly`]: residues mod q in the evaluation (NTT) domain. This is
//!   the encoding representation; all runtime algebra is pointwise here.
//!
//! Conversion between the two goes through [`NttContext`].

use super::ntt::NttContext;
use rug::ops::RemRounding;
use rug::{Float, Integer};
use std::ops::{Add, Neg, Sub};

/// Polynomial over Z in coefficient representation, reduced mod x^n + 1.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IntPoly {
    /// Coefficients, length n.
    pub coeffs: Vec<Integer>,
}

impl IntPoly {
    /// The zero polynomial of dimension n.
    pub fn zero(n: usize) -> Self {
        Self { coeffs: vec![Integer::new(); n] }
    }

    /// The constant polynomial 1.
    pub fn one(n: usize) -> Self {
        Self::constant(Integer::from(1), n)
    }

    /// A constant polynomial with the given value.
    pub fn constant(value: Integer, n: usize) -> Self {
        let mut coeffs = vec![Integer::new(); n];
        coeffs[0] = value;
        Self { coeffs }
    }

    /// Build from small signed coefficients.
    pub fn from_i64(coeffs: &[i64]) -> Self {
        Self { coeffs: coeffs.iter().map(|&c| Integer::from(c)).collect() }
    }

    /// Ring dimension n.
    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    /// True iff every coefficient is zero.
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| c.cmp0() == std::cmp::Ordering::Equal)
    }

    /// Squared Euclidean norm, exact.
    pub fn norm_sq(&self) -> Integer {
        let mut acc = Integer::new();
        for c in &self.coeffs {
            acc += Integer::from(c * c);
        }
        acc
    }

    /// Euclidean norm as a float of the given precision.
    pub fn norm(&self, prec: u32) -> Float {
        Float::with_val(prec, self.norm_sq()).sqrt()
    }

    /// Largest coefficient magnitude.
    pub fn inf_norm(&self) -> Integer {
        let mut max = Integer::new();
        for c in &self.coeffs {
            let a = Integer::from(c.abs_ref());
            if a > max {
                max = a;
            }
        }
        max
    }

    /// Negacyclic product: `self * other mod (x^n + 1)`.
    ///
    /// Schoolbook; only key generation multiplies in the coefficient
    /// domain, and always with one short operand, so the quadratic cost
    /// is irrelevant next to the NTT work.
    pub fn mul(&self, other: &IntPoly) -> IntPoly {
        let n = self.dimension();
        assert_eq!(n, other.dimension(), "dimension mismatch");

        let mut acc = vec![Integer::new(); n];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.cmp0() == std::cmp::Ordering::Equal {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                if b.cmp0() == std::cmp::Ordering::Equal {
                    continue;
                }
                let prod = Integer::from(a * b);
                let k = i + j;
                if k < n {
                    acc[k] += prod;
                } else {
                    acc[k - n] -= prod;
                }
            }
        }
        IntPoly { coeffs: acc }
    }
}

impl Add for &IntPoly {
    type Output = IntPoly;

    fn add(self, rhs: &IntPoly) -> IntPoly {
        assert_eq!(self.dimension(), rhs.dimension(), "dimension mismatch");
        IntPoly {
            coeffs: self
                .coeffs
                .iter()
                .zip(&rhs.coeffs)
                .map(|(a, b)| Integer::from(a + b))
                .collect(),
        }
    }
}

impl Sub for &IntPoly {
    type Output = IntPoly;

    fn sub(self, rhs: &IntPoly) -> IntPoly {
        assert_eq!(self.dimension(), rhs.dimension(), "dimension mismatch");
        IntPoly {
            coeffs: self
                .coeffs
                .iter()
                .zip(&rhs.coeffs)
                .map(|(a, b)| Integer::from(a - b))
                .collect(),
        }
    }
}

impl Neg for &IntPoly {
    type Output = IntPoly;

    fn neg(self) -> IntPoly {
        IntPoly { coeffs: self.coeffs.iter().map(|c| Integer::from(-c)).collect() }
    }
}

/// Polynomial over Z_q in the evaluation (NTT) domain.
///
/// All encoding algebra is pointwise on this representation. The modulus
/// travels with the value so that mixed-instance operations fail loudly.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModPoly {
    /// Evaluations at the (bit-reversed) powers of ψ, each in [0, q).
    pub evals: Vec<Integer>,
    /// Modulus q.
    pub q: Integer,
}

impl ModPoly {
    /// Evaluation-domain representation of the constant 1 (all ones).
    pub fn one(n: usize, q: Integer) -> Self {
        Self { evals: vec![Integer::from(1); n], q }
    }

    /// Ring dimension n.
    pub fn dimension(&self) -> usize {
        self.evals.len()
    }

    /// True iff every evaluation is zero.
    pub fn is_zero(&self) -> bool {
        self.evals.iter().all(|c| c.cmp0() == std::cmp::Ordering::Equal)
    }

    /// Pointwise product mod q.
    pub fn mul(&self, rhs: &ModPoly) -> ModPoly {
        self.check_compatible(rhs);
        ModPoly {
            evals: self
                .evals
                .iter()
                .zip(&rhs.evals)
                .map(|(a, b)| Integer::from(a * b) % &self.q)
                .collect(),
            q: self.q.clone(),
        }
    }

    /// Pointwise sum mod q.
    pub fn add(&self, rhs: &ModPoly) -> ModPoly {
        self.check_compatible(rhs);
        ModPoly {
            evals: self
                .evals
                .iter()
                .zip(&rhs.evals)
                .map(|(a, b)| {
                    let mut s = Integer::from(a + b);
                    if s >= self.q {
                        s -= &self.q;
                    }
                    s
                })
                .collect(),
            q: self.q.clone(),
        }
    }

    /// Pointwise difference mod q.
    pub fn sub(&self, rhs: &ModPoly) -> ModPoly {
        self.check_compatible(rhs);
        ModPoly {
            evals: self
                .evals
                .iter()
                .zip(&rhs.evals)
                .map(|(a, b)| {
                    let mut d = Integer::from(a - b);
                    if d.cmp0() == std::cmp::Ordering::Less {
                        d += &self.q;
                    }
                    d
                })
                .collect(),
            q: self.q.clone(),
        }
    }

    /// Pointwise k-th power mod q.
    pub fn pow(&self, k: u64) -> ModPoly {
        let e = Integer::from(k);
        ModPoly {
            evals: self
                .evals
                .iter()
                .map(|a| {
                    a.clone()
                        .pow_mod(&e, &self.q)
                        .expect("pow_mod with non-negative exponent cannot fail")
                })
                .collect(),
            q: self.q.clone(),
        }
    }

    /// Pointwise inverse mod q, or `None` if any evaluation is zero.
    ///
    /// A zero evaluation means the element is a zero divisor in R_q; for
    /// uniformly random elements this has negligible probability.
    pub fn invert(&self) -> Option<ModPoly> {
        let mut evals = Vec::with_capacity(self.evals.len());
        for a in &self.evals {
            match a.clone().invert(&self.q) {
                Ok(inv) => evals.push(inv),
                Err(_) => return None,
            }
        }
        Some(ModPoly { evals, q: self.q.clone() })
    }

    fn check_compatible(&self, rhs: &ModPoly) {
        assert_eq!(self.dimension(), rhs.dimension(), "dimension mismatch");
        assert_eq!(self.q, rhs.q, "modulus mismatch");
    }
}

impl NttContext {
    /// Convert a coefficient-domain polynomial into the evaluation domain.
    pub fn encode(&self, p: &IntPoly) -> ModPoly {
        assert_eq!(p.dimension(), self.dimension(), "dimension mismatch");

        let q = self.modulus();
        let mut evals: Vec<Integer> = p
            .coeffs
            .iter()
            .map(|c| c.clone().rem_euc(q.clone()))
            .collect();
        self.forward(&mut evals);
        ModPoly { evals, q: q.clone() }
    }

    /// Convert back to coefficients, each in [0, q).
    pub fn decode(&self, p: &ModPoly) -> IntPoly {
        assert_eq!(p.dimension(), self.dimension(), "dimension mismatch");
        assert_eq!(&p.q, self.modulus(), "modulus mismatch");

        let mut coeffs = p.evals.clone();
        self.inverse(&mut coeffs);
        IntPoly { coeffs }
    }

    /// Convert back to coefficients in centered representation,
    /// each in (-q/2, q/2].
    pub fn decode_centered(&self, p: &ModPoly) -> IntPoly {
        let mut out = self.decode(p);
        let q = self.modulus();
        let half = Integer::from(q >> 1u32);
        for c in &mut out.coeffs {
            if *c > half {
                *c -= q;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> NttContext {
        NttContext::new(16, Integer::from(97))
    }

    #[test]
    fn test_schoolbook_negacyclic_wraparound() {
        // (x^15)·(x^2) = x^17 = -x in R.
        let mut a = vec![0i64; 16];
        a[15] = 1;
        let mut b = vec![0i64; 16];
        b[2] = 1;

        let prod = IntPoly::from_i64(&a).mul(&IntPoly::from_i64(&b));
        let mut expected = vec![0i64; 16];
        expected[1] = -1;
        assert_eq!(prod, IntPoly::from_i64(&expected));
    }

    #[test]
    fn test_ntt_mul_matches_schoolbook() {
        let ctx = ctx();
        let a = IntPoly::from_i64(&[3, -1, 4, 1, -5, 9, 2, -6, 5, 3, -5, 8, 9, -7, 9, 3]);
        let b = IntPoly::from_i64(&[2, 7, -1, 8, 2, -8, 1, 8, -2, 8, 4, -5, 9, 0, 4, -5]);

        let direct = a.mul(&b);
        let via_ntt = ctx.decode_centered(&ctx.encode(&a).mul(&ctx.encode(&b)));

        // Products stay well below q/2 = 48? They do not; compare mod q.
        let q = Integer::from(97);
        for (x, y) in direct.coeffs.iter().zip(&via_ntt.coeffs) {
            assert_eq!(
                Integer::from(x - y).rem_euc(q.clone()),
                Integer::new(),
                "mismatch between schoolbook and NTT product"
            );
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let ctx = ctx();
        let a = IntPoly::from_i64(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(ctx.decode(&ctx.encode(&a)), a);
    }

    #[test]
    fn test_centered_decode() {
        let ctx = ctx();
        let a = IntPoly::from_i64(&[-1, -2, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(ctx.decode_centered(&ctx.encode(&a)), a);
    }

    #[test]
    fn test_modpoly_one_is_multiplicative_identity() {
        let ctx = ctx();
        let a = ctx.encode(&IntPoly::from_i64(&[5, 4, 3, 2, 1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 1]));
        let one = ModPoly::one(16, Integer::from(97));
        assert_eq!(a.mul(&one), a);

        // And it matches the transform of the constant 1.
        assert_eq!(ctx.encode(&IntPoly::one(16)), one);
    }

    #[test]
    fn test_invert() {
        let ctx = ctx();
        let a = ctx.encode(&IntPoly::from_i64(&[7, 1, 0, 0, 2, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 3]));
        if let Some(inv) = a.invert() {
            assert_eq!(a.mul(&inv), ModPoly::one(16, Integer::from(97)));
        }

        let zero = ctx.encode(&IntPoly::zero(16));
        assert!(zero.invert().is_none());
    }

    #[test]
    fn test_norms() {
        let a = IntPoly::from_i64(&[3, -4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(a.norm_sq(), Integer::from(25));
        assert_eq!(a.inf_norm(), Integer::from(4));
        assert!((a.norm(64).to_f64() - 5.0).abs() < 1e-12);
    }
}
