//! The encoding algebra: sampling, elevation, arithmetic, zero-testing
//! and extraction.
//!
//! An encoding of a coset c + ⟨g⟩ at level ℓ is the evaluation-domain
//! value [u/z^ℓ]_q with u ≡ c (mod ⟨g⟩) and u short. Levels are carried
//! explicitly and every operation checks them: multiplication past the
//! degree κ and mismatched-level addition are errors rather than silent
//! garbage. Zero-testing and extraction are defined at level κ only.

use crate::error::{config_err, GghError, Result};
use crate::keys::{PublicKey, SecretKey};
use crate::lattice::babai_reduce;
use crate::math::{GaussianSampler, IntPoly, ModPoly, S_TO_SIGMA};
use rand::Rng;
use rug::Integer;

/// A level-tagged encoding.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Encoding {
    value: ModPoly,
    level: usize,
}

/// Fresh re-randomization noise ρ₀·x₀ + ρ₁·x₁ for a masked level.
fn rerand_noise<R: Rng>(pk: &PublicKey, level: usize, rng: &mut R) -> Result<ModPoly> {
    let [x0, x1] = pk
        .rerandomizers(level)
        .ok_or_else(|| config_err!("no re-randomization basis at level {}", level))?;

    let sampler = GaussianSampler::new(pk.params.sigma_s * S_TO_SIGMA);
    let rho0 = pk.ntt.encode(&IntPoly::from_i64(&sampler.sample_vec(pk.params.n, rng)));
    let rho1 = pk.ntt.encode(&IntPoly::from_i64(&sampler.sample_vec(pk.params.n, rng)));
    Ok(rho0.mul(x0).add(&rho1.mul(x1)))
}

impl Encoding {
    /// The exact level-0 encoding of one.
    pub fn one(pk: &PublicKey) -> Encoding {
        Encoding {
            value: ModPoly::one(pk.params.n, pk.params.q.clone()),
            level: 0,
        }
    }

    /// Sample a fresh level-0 encoding of a random short coset.
    pub fn sample<R: Rng>(pk: &PublicKey, rng: &mut R) -> Encoding {
        Self::sample_with_cleartext(pk, rng).0
    }

    /// Sample a fresh level-0 encoding, returning the sampled cleartext
    /// alongside it.
    pub fn sample_with_cleartext<R: Rng>(pk: &PublicKey, rng: &mut R) -> (Encoding, IntPoly) {
        let sampler = GaussianSampler::new(pk.params.sigma_p * S_TO_SIGMA);
        let clr = IntPoly::from_i64(&sampler.sample_vec(pk.params.n, rng));
        let enc = Encoding { value: pk.ntt.encode(&clr), level: 0 };
        (enc, clr)
    }

    /// The level of this encoding.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The raw evaluation-domain value.
    pub fn value(&self) -> &ModPoly {
        &self.value
    }

    /// Raise the encoding by `by` levels, multiplying by the public
    /// encoding of one once per level. With `rerandomize`, each step's
    /// encoding of one gets fresh noise from the level-1 basis mixed in.
    pub fn elevate<R: Rng>(
        &self,
        pk: &PublicKey,
        by: usize,
        rerandomize: bool,
        rng: &mut R,
    ) -> Result<Encoding> {
        let target = self.level + by;
        if target > pk.params.kappa {
            return Err(GghError::LevelOverflow { level: target, kappa: pk.params.kappa });
        }

        let mut value = self.value.clone();
        for _ in 0..by {
            let mut one = pk.y.clone();
            if rerandomize {
                one = one.add(&rerand_noise(pk, 1, rng)?);
            }
            value = value.mul(&one);
        }
        Ok(Encoding { value, level: target })
    }

    /// Re-randomize a level-1 encoding in place within its coset.
    pub fn rerandomize<R: Rng>(&self, pk: &PublicKey, rng: &mut R) -> Result<Encoding> {
        if self.level != 1 {
            return Err(config_err!(
                "re-randomization is supported at level 1, encoding is at level {}",
                self.level
            ));
        }
        Ok(Encoding {
            value: self.value.add(&rerand_noise(pk, 1, rng)?),
            level: 1,
        })
    }

    /// Multiply two encodings; levels add and must not exceed κ.
    pub fn mul(&self, pk: &PublicKey, rhs: &Encoding) -> Result<Encoding> {
        let level = self.level + rhs.level;
        if level > pk.params.kappa {
            return Err(GghError::LevelOverflow { level, kappa: pk.params.kappa });
        }
        Ok(Encoding { value: self.value.mul(&rhs.value), level })
    }

    /// Add two encodings of the same level.
    pub fn add(&self, rhs: &Encoding) -> Result<Encoding> {
        self.check_same_level(rhs)?;
        Ok(Encoding { value: self.value.add(&rhs.value), level: self.level })
    }

    /// Subtract two encodings of the same level.
    pub fn sub(&self, rhs: &Encoding) -> Result<Encoding> {
        self.check_same_level(rhs)?;
        Ok(Encoding { value: self.value.sub(&rhs.value), level: self.level })
    }

    fn check_same_level(&self, rhs: &Encoding) -> Result<()> {
        if self.level != rhs.level {
            return Err(config_err!(
                "encoding levels differ: {} vs {}",
                self.level,
                rhs.level
            ));
        }
        Ok(())
    }

    /// Zero-test a top-level encoding: multiply by the zero-testing
    /// parameter and check that every centered coefficient stays below
    /// q^(1-ξ).
    pub fn is_zero(&self, pk: &PublicKey) -> Result<bool> {
        let w = self.zero_tested(pk)?;
        let coeffs = pk.ntt.decode_centered(&w);
        Ok(coeffs
            .coeffs
            .iter()
            .all(|c| Integer::from(c.abs_ref()) < *pk.params.zt_bound()))
    }

    /// Extract the canonical representation of a top-level encoding's
    /// coset: the top ℓ bits of each zero-tested coefficient, packed
    /// most-significant-bit first.
    pub fn extract(&self, pk: &PublicKey) -> Result<Vec<u8>> {
        let w = self.zero_tested(pk)?;
        let coeffs = pk.ntt.decode(&w);
        let q_bits = pk.params.q.significant_bits();
        let ell = pk.params.ell as u32;

        let mut out = vec![0u8; (pk.params.n * pk.params.ell + 7) / 8];
        let mut pos = 0;
        for c in &coeffs.coeffs {
            let top = Integer::from(c >> (q_bits - ell));
            for i in (0..ell).rev() {
                if top.get_bit(i) {
                    out[pos / 8] |= 1 << (7 - pos % 8);
                }
                pos += 1;
            }
        }
        Ok(out)
    }

    fn zero_tested(&self, pk: &PublicKey) -> Result<ModPoly> {
        if self.level != pk.params.kappa {
            return Err(config_err!(
                "zero test requires a level-{} encoding, got level {}",
                pk.params.kappa,
                self.level
            ));
        }
        Ok(self.value.mul(&pk.pzt))
    }
}

impl SecretKey {
    /// Encode a given cleartext at a level, reducing it first to a short
    /// coset representative modulo ⟨g⟩. With `rerandomize`, every
    /// elevation step mixes in fresh level-1 noise.
    pub fn encode<R: Rng>(
        &self,
        cleartext: &IntPoly,
        level: usize,
        rerandomize: bool,
        rng: &mut R,
    ) -> Result<Encoding> {
        if cleartext.dimension() != self.pk.params.n {
            return Err(config_err!(
                "cleartext dimension {} does not match ring dimension {}",
                cleartext.dimension(),
                self.pk.params.n
            ));
        }

        let reduced = babai_reduce(cleartext, &self.g, self.pk.params.prec());
        let enc = Encoding { value: self.pk.ntt.encode(&reduced), level: 0 };
        enc.elevate(&self.pk, level, rerandomize, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Flags;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn instance() -> (SecretKey, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
        let sk = SecretKey::generate(4, 1, 1, Flags::default(), &mut rng).unwrap();
        (sk, rng)
    }

    #[test]
    fn test_one_is_multiplicative_identity() {
        let (sk, mut rng) = instance();
        let pk = sk.public_key();

        let e = Encoding::sample(pk, &mut rng);
        let product = Encoding::one(pk).mul(pk, &e).unwrap();
        assert_eq!(product, e);
    }

    #[test]
    fn test_level_checks() {
        let (sk, mut rng) = instance();
        let pk = sk.public_key();

        let e0 = Encoding::sample(pk, &mut rng);
        let e1 = e0.elevate(pk, 1, false, &mut rng).unwrap();
        assert_eq!(e1.level(), 1);

        assert!(matches!(
            e0.elevate(pk, 2, false, &mut rng),
            Err(GghError::LevelOverflow { level: 2, kappa: 1 })
        ));
        assert!(matches!(
            e1.mul(pk, &e1),
            Err(GghError::LevelOverflow { level: 2, kappa: 1 })
        ));
        assert!(e1.add(&e0).is_err());
        assert!(e0.sub(&e1).is_err());
        assert!(e0.is_zero(pk).is_err());
        assert!(e0.extract(pk).is_err());
    }

    #[test]
    fn test_same_cleartext_tests_zero() {
        let (sk, mut rng) = instance();
        let pk = sk.public_key();

        let clr = IntPoly::from_i64(&vec![3; pk.params.n]);
        let u = sk.encode(&clr, 1, false, &mut rng).unwrap();
        let v = sk.encode(&clr, 1, false, &mut rng).unwrap();
        assert!(u.sub(&v).unwrap().is_zero(pk).unwrap());
    }

    #[test]
    fn test_rerandomized_encodings_stay_in_coset() {
        let (sk, mut rng) = instance();
        let pk = sk.public_key();

        let clr = IntPoly::from_i64(&vec![7; pk.params.n]);
        let u = sk.encode(&clr, 1, true, &mut rng).unwrap();
        let v = sk.encode(&clr, 1, true, &mut rng).unwrap();
        assert_ne!(u, v, "re-randomization must change the value");
        assert!(u.sub(&v).unwrap().is_zero(pk).unwrap());

        let w = u.rerandomize(pk, &mut rng).unwrap();
        assert_ne!(u, w);
        assert!(u.sub(&w).unwrap().is_zero(pk).unwrap());
    }

    #[test]
    fn test_distinct_cleartexts_do_not_test_zero() {
        for seed in [0x5EED, 1, 2, 3, 4, 5] {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let sk = SecretKey::generate(4, 1, 1, Flags::default(), &mut rng).unwrap();
            let pk = sk.public_key();

            let a = IntPoly::from_i64(&vec![3; pk.params.n]);
            let mut shifted = a.clone();
            shifted.coeffs[0] += 1;

            let u = sk.encode(&a, 1, false, &mut rng).unwrap();
            let v = sk.encode(&shifted, 1, false, &mut rng).unwrap();
            assert!(
                !u.sub(&v).unwrap().is_zero(pk).unwrap(),
                "false zero for seed {}",
                seed
            );
        }
    }

    #[test]
    fn test_extraction_is_canonical_per_coset() {
        let (sk, mut rng) = instance();
        let pk = sk.public_key();

        let clr = IntPoly::from_i64(&vec![5; pk.params.n]);
        let mut same_coset = clr.clone();
        // Shift by g·(1 + x): same coset, different representative.
        let shift = sk.generator().mul(&IntPoly::from_i64(
            &[vec![1, 1], vec![0; pk.params.n - 2]].concat(),
        ));
        same_coset = &same_coset + &shift;

        let u = sk.encode(&clr, 1, true, &mut rng).unwrap();
        let v = sk.encode(&same_coset, 1, true, &mut rng).unwrap();
        assert_eq!(u.extract(pk).unwrap(), v.extract(pk).unwrap());

        let mut other = clr.clone();
        other.coeffs[0] += 1;
        let w = sk.encode(&other, 1, false, &mut rng).unwrap();
        assert_ne!(u.extract(pk).unwrap(), w.extract(pk).unwrap());
    }

    #[test]
    fn test_sampled_cleartext_matches_encoding() {
        let (sk, mut rng) = instance();
        let pk = sk.public_key();

        let (enc, clr) = Encoding::sample_with_cleartext(pk, &mut rng);
        let u = enc.elevate(pk, 1, false, &mut rng).unwrap();
        let v = sk.encode(&clr, 1, false, &mut rng).unwrap();
        assert!(u.sub(&v).unwrap().is_zero(pk).unwrap());
    }

    #[test]
    fn test_rerandomize_needs_basis() {
        let mut rng = ChaCha20Rng::seed_from_u64(0x5EED);
        let sk = SecretKey::generate(4, 1, 0, Flags::default(), &mut rng).unwrap();
        let pk = sk.public_key();

        let e1 = Encoding::sample(pk, &mut rng)
            .elevate(pk, 1, false, &mut rng)
            .unwrap();
        assert!(e1.rerandomize(pk, &mut rng).is_err());
        assert!(Encoding::sample(pk, &mut rng)
            .elevate(pk, 1, true, &mut rng)
            .is_err());
    }
}
