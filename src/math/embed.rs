//! Canonical embedding of R = Z[x]/(x^n + 1) into C^n.
//!
//! Evaluates a polynomial at the n primitive 2n-th roots of unity
//! ζ^(2j+1), via a coefficient twist by ζ^j followed by a size-n complex
//! FFT. Key generation uses this for two quality checks that have no
//! exact integer formulation: the norm of the inverse of the ideal
//! generator, and the smallest singular value of the stacked
//! re-randomization basis.
//!
//! Precision is caller-chosen `rug::Float` precision; the checks compare
//! against bounds with many bits of slack, so modest precision suffices.

use super::poly::IntPoly;
use rug::float::Constant;
use rug::{Complex, Float};

/// |c|² as a real float.
fn mag_sq(c: &Complex) -> Float {
    Float::with_val(c.prec().0, c.real() * c.real()) + Float::with_val(c.prec().1, c.imag() * c.imag())
}

/// In-place iterative radix-2 FFT. Length must be a power of two.
pub fn fft(a: &mut [Complex], invert: bool) {
    let n = a.len();
    assert!(n.is_power_of_two(), "FFT length must be a power of two");
    if n <= 1 {
        return;
    }
    let prec = a[0].prec().0;

    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            a.swap(i, j);
        }
    }

    let pi = Float::with_val(prec, Constant::Pi);
    let mut len = 2;
    while len <= n {
        let mut ang = Float::with_val(prec, &pi * 2u32) / Float::with_val(prec, len as u32);
        if invert {
            ang = -ang;
        }
        let (sin, cos) = ang.sin_cos(Float::new(prec));
        let w_len = Complex::with_val(prec, (cos, sin));

        for start in (0..n).step_by(len) {
            let mut w = Complex::with_val(prec, (1, 0));
            for k in start..start + len / 2 {
                let u = a[k].clone();
                let v = Complex::with_val(prec, &a[k + len / 2] * &w);
                a[k] = Complex::with_val(prec, &u + &v);
                a[k + len / 2] = u - v;
                w *= &w_len;
            }
        }
        len <<= 1;
    }

    if invert {
        for x in a.iter_mut() {
            *x /= n as u32;
        }
    }
}

/// Canonical embedding: evaluations of `p` at ζ^(2j+1) for j = 0..n,
/// where ζ = exp(iπ/n).
pub fn embed(p: &IntPoly, prec: u32) -> Vec<Complex> {
    let n = p.dimension();
    let pi = Float::with_val(prec, Constant::Pi);

    // Twist by ζ^j so the plain size-n FFT lands on the odd powers.
    let mut a: Vec<Complex> = p
        .coeffs
        .iter()
        .enumerate()
        .map(|(j, c)| {
            let ang = Float::with_val(prec, &pi * (j as u32)) / Float::with_val(prec, n as u32);
            let (sin, cos) = ang.sin_cos(Float::new(prec));
            Complex::with_val(prec, (cos, sin)) * Float::with_val(prec, c)
        })
        .collect();

    fft(&mut a, false);
    a
}

/// Inverse of [`embed`]: recover real coefficient approximations from
/// evaluations at ζ^(2j+1). Used by Babai round-off, where the quotient
/// is only near-integral.
pub fn unembed(mut evals: Vec<Complex>) -> Vec<Float> {
    let n = evals.len();
    let prec = evals[0].prec().0;
    let pi = Float::with_val(prec, Constant::Pi);

    fft(&mut evals, true);
    evals
        .into_iter()
        .enumerate()
        .map(|(j, c)| {
            let ang = -Float::with_val(prec, &pi * (j as u32)) / Float::with_val(prec, n as u32);
            let (sin, cos) = ang.sin_cos(Float::new(prec));
            let untwisted = c * Complex::with_val(prec, (cos, sin));
            Float::with_val(prec, untwisted.real())
        })
        .collect()
}

/// Euclidean norm of the coefficient vector of p^(-1) in Q[x]/(x^n + 1).
///
/// By Parseval this is sqrt(Σ_j |p(ζ_j)|^(-2) / n). Returns +∞ when some
/// evaluation is (numerically) zero, which any upper-bound check then
/// rejects.
pub fn inverse_norm(p: &IntPoly, prec: u32) -> Float {
    let n = p.dimension();
    let mut acc = Float::new(prec);
    for e in embed(p, prec) {
        acc += mag_sq(&e).recip();
    }
    (acc / Float::with_val(prec, n as u32)).sqrt()
}

/// Smallest paired evaluation magnitude of two polynomials:
/// min_j sqrt(|b0(ζ_j)|² + |b1(ζ_j)|²).
///
/// This is the smallest singular value of the stacked rotation basis
/// [rot(b0); rot(b1)], used by the optional basis quality check.
pub fn min_paired_eval(b0: &IntPoly, b1: &IntPoly, prec: u32) -> Float {
    assert_eq!(b0.dimension(), b1.dimension(), "dimension mismatch");

    let e0 = embed(b0, prec);
    let e1 = embed(b1, prec);
    let mut min: Option<Float> = None;
    for (x, y) in e0.iter().zip(&e1) {
        let s = (mag_sq(x) + mag_sq(y)).sqrt();
        match &min {
            Some(m) if *m <= s => {}
            _ => min = Some(s),
        }
    }
    min.expect("dimension is at least one")
}
