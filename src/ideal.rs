//! Arithmetic on the ideal ⟨g⟩ ⊂ Z[x]/(x^n + 1).
//!
//! The algebraic norm N(g) = Res(g, x^n + 1) drives two generation-time
//! checks: the optional probable-prime test on ⟨g⟩, and coprimality of
//! re-randomization multiplier pairs. The norm itself is a few thousand
//! bits wide, so it is assembled by CRT from residues modulo word-size
//! primes: primes p ≡ 1 (mod 2n) admit an evaluation-product formula
//! through the negacyclic NTT, and arbitrary small primes fall back to a
//! Euclidean resultant over Z_p.

use crate::math::{IntPoly, NttContext};
use rug::integer::IsPrime;
use rug::ops::RemRounding;
use rug::Integer;

fn mul_mod(a: u64, b: u64, p: u64) -> u64 {
    ((a as u128 * b as u128) % p as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, p: u64) -> u64 {
    let mut acc = 1u64;
    base %= p;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, p);
        }
        base = mul_mod(base, base, p);
        exp >>= 1;
    }
    acc
}

/// Word-size primes p ≡ 1 (mod 2n), ascending from 2^30.
fn norm_primes(n: usize) -> impl Iterator<Item = u64> {
    let two_n = 2 * n as u64;
    let start = (1u64 << 30) / two_n + 1;
    (start..)
        .map(move |k| k * two_n + 1)
        .filter(|&p| Integer::from(p).is_probably_prime(30) != IsPrime::No)
}

/// N(g) mod p for a prime p ≡ 1 (mod 2n).
///
/// x^n + 1 splits completely mod such p, so the resultant is the product
/// of the evaluations of g at the primitive 2n-th roots of unity, which
/// are exactly the outputs of the negacyclic NTT.
pub fn norm_mod_prime(g: &IntPoly, p: u64) -> u64 {
    let ctx = NttContext::new(g.dimension(), Integer::from(p));
    let evals = ctx.encode(g);

    let mut acc = 1u64;
    for e in &evals.evals {
        acc = mul_mod(acc, e.to_u64().expect("evaluation fits in a word"), p);
    }
    acc
}

fn trim(a: &mut Vec<u64>) {
    while a.last() == Some(&0) {
        a.pop();
    }
}

fn poly_rem(a: &[u64], b: &[u64], p: u64) -> Vec<u64> {
    let mut r = a.to_vec();
    let db = b.len() - 1;
    let lead_inv = pow_mod(b[db], p - 2, p);

    while r.len() > db {
        let dr = r.len() - 1;
        let c = mul_mod(r[dr], lead_inv, p);
        if c != 0 {
            for i in 0..db {
                let sub = mul_mod(c, b[i], p);
                r[dr - db + i] = (r[dr - db + i] + p - sub) % p;
            }
        }
        r.pop();
    }
    trim(&mut r);
    r
}

/// Res(f, h) mod p by the Euclidean algorithm over Z_p.
fn resultant_mod(f: &[u64], h: &[u64], p: u64) -> u64 {
    let mut a = f.to_vec();
    let mut b = h.to_vec();
    trim(&mut a);
    trim(&mut b);

    let mut res = 1u64;
    loop {
        if b.is_empty() {
            return 0;
        }
        let da = a.len() - 1;
        let db = b.len() - 1;
        if db == 0 {
            return mul_mod(res, pow_mod(b[0], da as u64, p), p);
        }

        let r = poly_rem(&a, &b, p);
        let dr = if r.is_empty() { 0 } else { r.len() - 1 };

        if da % 2 == 1 && db % 2 == 1 {
            res = (p - res) % p;
        }
        res = mul_mod(res, pow_mod(b[db], (da - dr) as u64, p), p);

        a = b;
        b = r;
    }
}

/// N(g) mod p for an arbitrary prime p, including primes where x^n + 1
/// does not split.
pub fn norm_mod_small_prime(g: &IntPoly, p: u64) -> u64 {
    let n = g.dimension();
    let mut f = vec![0u64; n + 1];
    f[0] = 1 % p;
    f[n] = 1 % p;

    let h: Vec<u64> = g
        .coeffs
        .iter()
        .map(|c| {
            c.clone()
                .rem_euc(Integer::from(p))
                .to_u64()
                .expect("residue fits in a word")
        })
        .collect();

    resultant_mod(&f, &h, p)
}

/// Exact algebraic norm N(g) = Res(g, x^n + 1), assembled by CRT.
///
/// The norm of an element of Z[x]/(x^n + 1) is a product of paired
/// complex conjugate evaluations, hence non-negative; the Hadamard bound
/// (√2·‖g‖₂)^n tells us how many word primes pin it down.
pub fn ideal_norm(g: &IntPoly) -> Integer {
    let n = g.dimension();
    let bound_bits = (g.norm_sq().significant_bits() as u64 + 2) * n as u64 / 2 + 2;

    let mut acc = Integer::new();
    let mut modulus = Integer::from(1);
    for p in norm_primes(n) {
        let r = Integer::from(norm_mod_prime(g, p));
        let p = Integer::from(p);

        // Lift: find acc' ≡ acc (mod modulus), ≡ r (mod p).
        let step = Integer::from(&r - &acc).rem_euc(p.clone());
        let coeff = modulus
            .clone()
            .invert(&p)
            .expect("distinct primes are coprime");
        let t = Integer::from(&step * &coeff).rem_euc(p.clone());
        acc += t * &modulus;
        modulus *= &p;

        if modulus.significant_bits() as u64 > bound_bits {
            break;
        }
    }
    acc
}

/// Primes below `bound`, by trial division. Screening bounds are tiny
/// (a few thousand at most), so nothing fancier is warranted.
fn small_primes(bound: u64) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::new();
    for c in 2..bound {
        if primes.iter().take_while(|&&p| p * p <= c).all(|&p| c % p != 0) {
            primes.push(c);
        }
    }
    primes
}

/// Whether N(g) has a prime factor below `bound`.
pub fn has_small_prime_factor(g: &IntPoly, bound: u64) -> bool {
    small_primes(bound)
        .iter()
        .any(|&p| norm_mod_small_prime(g, p) == 0)
}

/// Whether N(a) and N(b) share a prime factor below `bound`.
pub fn share_small_prime_factor(a: &IntPoly, b: &IntPoly, bound: u64) -> bool {
    small_primes(bound)
        .iter()
        .any(|&p| norm_mod_small_prime(a, p) == 0 && norm_mod_small_prime(b, p) == 0)
}

/// Probable-primality of the ideal ⟨g⟩, i.e. of its norm N(g).
///
/// Screens with a handful of small primes before paying for the exact
/// norm and a Miller-Rabin round on it.
pub fn is_probable_prime_ideal(g: &IntPoly) -> bool {
    for p in [2u64, 3, 5, 7, 11, 13, 17, 19] {
        if norm_mod_small_prime(g, p) == 0 {
            return false;
        }
    }
    ideal_norm(g).is_probably_prime(20) != IsPrime::No
}

/// Whether ⟨a⟩ + ⟨b⟩ = R, tested as gcd(N(a), N(b)) = 1.
pub fn are_coprime_ideals(a: &IntPoly, b: &IntPoly) -> bool {
    // A shared factor of two is by far the most common rejection; the
    // parities of a(1) and b(1) decide it without any norm work.
    if norm_mod_small_prime(a, 2) == 0 && norm_mod_small_prime(b, 2) == 0 {
        return false;
    }
    ideal_norm(a).gcd(&ideal_norm(b)) == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_of_linear_polynomial() {
        // N(x + 2) = Res(x^4 + 1, x + 2) = (-2)^4 + 1 = 17.
        let g = IntPoly::from_i64(&[2, 1, 0, 0]);
        assert_eq!(ideal_norm(&g), Integer::from(17));
    }

    #[test]
    fn test_norm_of_constant() {
        // N(c) = c^n.
        let g = IntPoly::constant(Integer::from(3), 4);
        assert_eq!(ideal_norm(&g), Integer::from(81));
    }

    #[test]
    fn test_norm_is_multiplicative() {
        let a = IntPoly::from_i64(&[1, 2, 0, -1, 3, 0, 1, -2]);
        let b = IntPoly::from_i64(&[-2, 1, 1, 0, 0, 2, -1, 1]);
        assert_eq!(
            ideal_norm(&a.mul(&b)),
            Integer::from(ideal_norm(&a) * ideal_norm(&b))
        );
    }

    #[test]
    fn test_residues_agree_with_exact_norm() {
        let g = IntPoly::from_i64(&[5, -3, 2, 7]);
        let exact = ideal_norm(&g);

        for p in [7u64, 11, 13, 101] {
            let expected = exact
                .clone()
                .rem_euc(Integer::from(p))
                .to_u64()
                .unwrap();
            assert_eq!(norm_mod_small_prime(&g, p), expected, "mismatch mod {}", p);
        }

        // And the split-prime path: 17 ≡ 1 (mod 8).
        let expected = exact.rem_euc(Integer::from(17)).to_u64().unwrap();
        assert_eq!(norm_mod_prime(&g, 17), expected);
    }

    #[test]
    fn test_prime_ideal() {
        // N(x + 2) = 17, prime.
        assert!(is_probable_prime_ideal(&IntPoly::from_i64(&[2, 1, 0, 0])));
        // N(2) = 16, composite.
        assert!(!is_probable_prime_ideal(&IntPoly::constant(Integer::from(2), 4)));
    }

    #[test]
    fn test_coprimality() {
        let a = IntPoly::from_i64(&[2, 1, 0, 0]); // norm 17
        let b = IntPoly::from_i64(&[1, 1, 0, 0]); // norm 2
        assert!(are_coprime_ideals(&a, &b));
        assert!(!are_coprime_ideals(&a, &a));

        // Both norms even: rejected by the parity screen.
        let c = IntPoly::from_i64(&[1, 1, 2, 0]);
        let d = IntPoly::from_i64(&[3, 1, 0, 2]);
        assert_eq!(norm_mod_small_prime(&c, 2), 0);
        assert_eq!(norm_mod_small_prime(&d, 2), 0);
        assert!(!are_coprime_ideals(&c, &d));
    }

    #[test]
    fn test_small_prime_screens() {
        // N(2) = 16 = 2^4.
        let g = IntPoly::constant(Integer::from(2), 4);
        assert!(has_small_prime_factor(&g, 10));

        // N(x + 2) = 17.
        let h = IntPoly::from_i64(&[2, 1, 0, 0]);
        assert!(!has_small_prime_factor(&h, 17));
        assert!(has_small_prime_factor(&h, 18));

        assert!(share_small_prime_factor(&g, &g, 10));
        assert!(!share_small_prime_factor(&g, &h, 100));
    }

    #[test]
    fn test_small_primes_list() {
        assert_eq!(small_primes(20), vec![2, 3, 5, 7, 11, 13, 17, 19]);
    }
}
