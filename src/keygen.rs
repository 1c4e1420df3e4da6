//! Instance generation pipeline.
//!
//! [`SecretKey::generate`] runs the whole pipeline: sample the ideal
//! generator g, the masking unit z, the additive mask h, the
//! re-randomization bases, the unit a, then assemble the public
//! encodings y, x_i and the zero-testing parameter. Every sampling step
//! takes the caller's RNG handle; a fixed seed reproduces the instance
//! bit for bit.

use crate::error::{GghError, Result};
use crate::ideal;
use crate::keys::{PublicKey, SecretKey, Timings};
use crate::lattice::IdealSampler;
use crate::math::embed::{inverse_norm, min_paired_eval};
use crate::math::{sample_wide, GaussianSampler, IntPoly, ModPoly, NttContext, S_TO_SIGMA};
use crate::params::{Flags, Params};
use rand::Rng;
use rug::{Float, Integer};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Squared-norm acceptance bound ⌊(sqrt(n)·width)²⌋ as an integer.
fn norm_sq_bound(n: usize, width: f64) -> Integer {
    Float::with_val(64, n as f64 * width * width)
        .to_integer()
        .expect("bound is finite")
}

fn check_cap(what: &'static str, attempts: u64, flags: &Flags) -> Result<()> {
    match flags.max_attempts {
        Some(cap) if attempts >= cap => Err(GghError::DidNotConverge { what, attempts }),
        _ => Ok(()),
    }
}

impl SecretKey {
    /// Generate a fresh instance for the given knobs.
    pub fn generate<R: Rng>(
        lambda: usize,
        kappa: usize,
        rerand_mask: u64,
        flags: Flags,
        rng: &mut R,
    ) -> Result<SecretKey> {
        let params = Params::new(lambda, kappa, rerand_mask, flags)?;
        Self::generate_with_params(params, rng)
    }

    /// Generate a fresh instance for already-derived parameters.
    pub fn generate_with_params<R: Rng>(params: Params, rng: &mut R) -> Result<SecretKey> {
        let ntt = NttContext::new(params.n, params.q.clone());
        let mut timings = Timings::default();

        let g = sample_g(&params, &mut timings, rng)?;
        let (z, z_inv) = sample_z(&params, &ntt, rng)?;
        let h = sample_h(&params, &g, &mut timings, rng)?;
        let b = sample_b(&params, &g, &mut timings, rng)?;

        let sampler = IdealSampler::new(&g, params.sigma_p * S_TO_SIGMA);
        let a = sampler.sample_plus_one(rng);

        // y = [a/z]_q, the public level-1 encoding of one.
        let y = ntt.encode(&a).mul(&z_inv);

        // x_i = [b_i/z^level]_q for each masked level.
        let mut x = BTreeMap::new();
        for (&level, [b0, b1]) in &b {
            let z_inv_pow = z_inv.pow(level as u64);
            x.insert(
                level,
                [
                    ntt.encode(b0).mul(&z_inv_pow),
                    ntt.encode(b1).mul(&z_inv_pow),
                ],
            );
        }

        // pzt = [h·z^κ/g]_q.
        let g_inv = ntt.encode(&g).invert().ok_or(GghError::NotInvertible)?;
        let pzt = ntt
            .encode(&h)
            .mul(&z.pow(params.kappa as u64))
            .mul(&g_inv);

        let pk = PublicKey { params, ntt, y, x, pzt };
        Ok(SecretKey { pk, g, z, z_inv, h, a, b, timings })
    }
}

/// Draw the ideal generator g: Gaussian of width σ, accepted once it is
/// short, its norm passes the primality screen, and g⁻¹ is short enough.
fn sample_g<R: Rng>(params: &Params, timings: &mut Timings, rng: &mut R) -> Result<IntPoly> {
    let sampler = GaussianSampler::new(params.sigma * S_TO_SIGMA);
    let bound = norm_sq_bound(params.n, params.sigma);
    let ell_g = Float::with_val(params.prec(), params.ell_g);

    let mut attempts = 0u64;
    let (mut norm_fail, mut prime_fail, mut inv_fail) = (0u64, 0u64, 0u64);

    loop {
        check_cap("ideal generator", attempts, &params.flags)?;
        attempts += 1;

        let t = Instant::now();
        let g = IntPoly::from_i64(&sampler.sample_vec(params.n, rng));
        timings.sample += t.elapsed();

        if g.norm_sq() > bound {
            norm_fail += 1;
            continue;
        }

        let t = Instant::now();
        let good_ideal = if params.flags.prime_g {
            ideal::is_probable_prime_ideal(&g)
        } else {
            let screen = (params.kappa * params.kappa) as u64;
            !ideal::has_small_prime_factor(&g, screen)
        };
        timings.is_prime += t.elapsed();
        if !good_ideal {
            prime_fail += 1;
            continue;
        }

        if inverse_norm(&g, params.prec()) > ell_g {
            inv_fail += 1;
            continue;
        }

        debug!(attempts, norm_fail, prime_fail, inv_fail, "sampled ideal generator");
        return Ok(g);
    }
}

/// Draw the masking unit z uniformly in the evaluation domain and invert
/// it pointwise. A non-invertible draw means a zero evaluation, which for
/// a uniform draw modulo a large prime is a parameterization bug.
fn sample_z<R: Rng>(params: &Params, ntt: &NttContext, rng: &mut R) -> Result<(ModPoly, ModPoly)> {
    let evals = (0..params.n)
        .map(|_| crate::math::rand::uniform_below(&params.q, rng))
        .collect();
    let z = ModPoly { evals, q: params.q.clone() };
    let z_inv = z.invert().ok_or(GghError::NotInvertible)?;
    Ok((z, z_inv))
}

/// Draw the additive mask h of width sqrt(q), re-drawn until its ideal
/// shares no small prime factor with ⟨g⟩.
fn sample_h<R: Rng>(
    params: &Params,
    g: &IntPoly,
    timings: &mut Timings,
    rng: &mut R,
) -> Result<IntPoly> {
    let sigma = Float::with_val(params.prec(), &params.q).sqrt() * S_TO_SIGMA;
    let screen = 2 * params.lambda as u64;

    let mut attempts = 0u64;
    loop {
        check_cap("zero-test mask", attempts, &params.flags)?;
        attempts += 1;

        let t = Instant::now();
        let h = IntPoly {
            coeffs: (0..params.n).map(|_| sample_wide(&sigma, rng)).collect(),
        };
        timings.sample += t.elapsed();

        let t = Instant::now();
        let coprime = !ideal::share_small_prime_factor(&h, g, screen);
        timings.is_coprime += t.elapsed();

        if coprime {
            debug!(attempts, "sampled zero-test mask");
            return Ok(h);
        }
    }
}

/// Draw the re-randomization basis pair for each masked level: two
/// points of ⟨g⟩ whose multipliers generate coprime ideals and whose
/// stacked norm stays below sqrt(n)·σ'.
fn sample_b<R: Rng>(
    params: &Params,
    g: &IntPoly,
    timings: &mut Timings,
    rng: &mut R,
) -> Result<BTreeMap<usize, [IntPoly; 2]>> {
    let sampler = IdealSampler::new(g, params.sigma_p * S_TO_SIGMA);
    let bound = norm_sq_bound(params.n, params.sigma_p);
    let ell_b = Float::with_val(params.prec(), params.ell_b);

    let mut out = BTreeMap::new();
    for level in 1..=params.kappa {
        if !params.rerand_at(level) {
            continue;
        }

        if !params.flags.check_basis {
            warn!(level, "skipping least-singular-value check on re-randomization basis");
        }

        let mut attempts = 0u64;
        let (mut coprime_fail, mut norm_fail, mut quality_fail) = (0u64, 0u64, 0u64);
        loop {
            check_cap("re-randomization basis", attempts, &params.flags)?;
            attempts += 1;

            let t = Instant::now();
            let (b0, m0) = sampler.sample_pair(rng);
            let (b1, m1) = sampler.sample_pair(rng);
            timings.sample += t.elapsed();

            let t = Instant::now();
            let coprime = ideal::are_coprime_ideals(&m0, &m1);
            timings.is_coprime += t.elapsed();
            if !coprime {
                coprime_fail += 1;
                continue;
            }

            if Integer::from(b0.norm_sq() + b1.norm_sq()) > bound {
                norm_fail += 1;
                continue;
            }

            if params.flags.check_basis
                && min_paired_eval(&b0, &b1, params.prec()) < ell_b
            {
                quality_fail += 1;
                continue;
            }

            debug!(
                level,
                attempts, coprime_fail, norm_fail, quality_fail,
                "sampled re-randomization basis"
            );
            out.insert(level, [b0, b1]);
            break;
        }
    }
    Ok(out)
}
