//! Public and secret key material.
//!
//! The public key carries everything the encoding algebra needs: the
//! derived parameters, the NTT context for R_q, the level-1 encoding of
//! one, the re-randomizers for each masked level, and the zero-testing
//! parameter. The secret key wraps the public key together with the
//! trapdoor elements; those are wiped in place when the key is dropped.

use crate::math::{IntPoly, ModPoly, NttContext};
use crate::params::Params;
use rug::Integer;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroize;

impl Zeroize for IntPoly {
    fn zeroize(&mut self) {
        for c in &mut self.coeffs {
            let copy = c.clone();
            *c ^= copy;
        }
    }
}

impl Zeroize for ModPoly {
    fn zeroize(&mut self) {
        for c in &mut self.evals {
            let copy = c.clone();
            *c ^= copy;
        }
    }
}

/// Wall-clock cost of the expensive generation steps, accumulated across
/// rejection-loop iterations. Observability only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Timings {
    /// Time spent drawing Gaussian candidates.
    pub sample: Duration,
    /// Time spent on primality checks of N(g).
    pub is_prime: Duration,
    /// Time spent on coprimality checks between ideals.
    pub is_coprime: Duration,
}

/// Public parameters and encodings of a graded encoding instance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PublicKey {
    /// Derived parameters.
    pub params: Params,
    /// NTT context for R_q.
    pub(crate) ntt: NttContext,
    /// Level-1 encoding of one, [a/z]_q.
    pub(crate) y: ModPoly,
    /// Re-randomizers per masked level: x_i = [b_i/z^level]_q.
    pub(crate) x: BTreeMap<usize, [ModPoly; 2]>,
    /// Zero-testing parameter [h·z^κ/g]_q.
    pub(crate) pzt: ModPoly,
}

impl PublicKey {
    /// NTT context for this instance's R_q.
    pub fn ntt(&self) -> &NttContext {
        &self.ntt
    }

    /// The level-1 encoding of one.
    pub fn encoding_of_one(&self) -> &ModPoly {
        &self.y
    }

    /// Re-randomizer pair for a level, if that level is masked.
    pub fn rerandomizers(&self, level: usize) -> Option<&[ModPoly; 2]> {
        self.x.get(&level)
    }
}

/// Secret key: the public key plus the generation trapdoor.
#[derive(Debug)]
pub struct SecretKey {
    pub(crate) pk: PublicKey,
    /// Ideal generator g.
    pub(crate) g: IntPoly,
    /// Masking unit z (evaluation domain) and its inverse.
    pub(crate) z: ModPoly,
    pub(crate) z_inv: ModPoly,
    /// Additive mask h of the zero-testing parameter.
    pub(crate) h: IntPoly,
    /// Unit a ∈ 1 + ⟨g⟩, numerator of the encoding of one.
    pub(crate) a: IntPoly,
    /// Re-randomization basis numerators per masked level.
    pub(crate) b: BTreeMap<usize, [IntPoly; 2]>,
    pub(crate) timings: Timings,
}

impl SecretKey {
    /// The public part of the instance.
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Consume the key, keeping only the public part. The trapdoor is
    /// wiped on the way out.
    pub fn into_public_key(mut self) -> PublicKey {
        let pk = self.pk.clone();
        self.wipe();
        pk
    }

    /// The ideal generator.
    pub fn generator(&self) -> &IntPoly {
        &self.g
    }

    /// Order of the plaintext space R/⟨g⟩, i.e. N(g).
    pub fn plaintext_order(&self) -> Integer {
        crate::ideal::ideal_norm(&self.g)
    }

    /// Accumulated generation timings.
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Log the norms of the secret elements at debug level.
    pub fn log_norms(&self) {
        let prec = self.pk.params.prec();
        debug!(
            norm_g = self.g.norm(prec).to_f64(),
            norm_h = self.h.norm(prec).to_f64(),
            norm_a = self.a.norm(prec).to_f64(),
            "secret element norms"
        );
        for (level, [b0, b1]) in &self.b {
            debug!(
                level = *level,
                norm_b0 = b0.norm(prec).to_f64(),
                norm_b1 = b1.norm(prec).to_f64(),
                "re-randomization basis norms"
            );
        }
    }

    fn wipe(&mut self) {
        self.g.zeroize();
        self.z.zeroize();
        self.z_inv.zeroize();
        self.h.zeroize();
        self.a.zeroize();
        for [b0, b1] in self.b.values_mut() {
            b0.zeroize();
            b1.zeroize();
        }
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroize_int_poly() {
        let mut p = IntPoly::from_i64(&[1, -2, 3, 0]);
        p.zeroize();
        assert!(p.is_zero());
    }

    #[test]
    fn test_zeroize_mod_poly() {
        let mut p = ModPoly {
            evals: vec![Integer::from(5), Integer::from(91)],
            q: Integer::from(97),
        };
        p.zeroize();
        assert!(p.is_zero());
    }
}
