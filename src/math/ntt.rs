//! Number-Theoretic Transform over Z_q for arbitrary-precision q.
//!
//! Implements the negacyclic NTT for R_q = Z_q[x]/(x^n + 1): forward
//! Cooley-Tukey decimation-in-time, inverse Gentleman-Sande
//! decimation-in-frequency, with twiddle factors stored in bit-reversed
//! order. Encodings live permanently in the evaluation domain produced by
//! this transform; conversion back to coefficients happens only during
//! extraction and zero-testing.
//!
//! The modulus q of the scheme is hundreds to thousands of bits wide, so
//! all arithmetic is over `rug::Integer` rather than word-size residues.

use rug::Integer;

/// Precomputed NTT context for R_q = Z_q[x]/(x^n + 1).
///
/// Stores the powers of a primitive 2n-th root of unity ψ (and of ψ^-1)
/// in the bit-reversed order consumed by the butterflies. Create once per
/// scheme instance and reuse for every conversion.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NttContext {
    /// Ring dimension (power of two).
    n: usize,
    /// Modulus q ≡ 1 (mod 2n), prime.
    q: Integer,
    /// Forward twiddle factors (powers of ψ, bit-reversed order).
    psi_pow: Vec<Integer>,
    /// Inverse twiddle factors (powers of ψ^(-1), bit-reversed order).
    psi_inv_pow: Vec<Integer>,
    /// n^(-1) mod q for inverse scaling.
    n_inv: Integer,
}

fn pow_mod(base: &Integer, exp: &Integer, m: &Integer) -> Integer {
    base.clone()
        .pow_mod(exp, m)
        .expect("pow_mod with non-negative exponent cannot fail")
}

impl NttContext {
    /// Create an NTT context for dimension n and modulus q.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two or `q` is not ≡ 1 (mod 2n);
    /// the parameter deriver only ever produces moduli satisfying both.
    pub fn new(n: usize, q: Integer) -> Self {
        assert!(n.is_power_of_two(), "n must be a power of two");
        assert!(
            Integer::from(&q - 1u32).is_divisible(&Integer::from(2 * n as u64)),
            "q must be ≡ 1 (mod 2n)"
        );

        let psi = Self::find_primitive_root(n, &q);
        let psi_inv = psi
            .clone()
            .invert(&q)
            .expect("root of unity is invertible mod prime q");

        let psi_pow = Self::twiddle_table(n, &psi, &q);
        let psi_inv_pow = Self::twiddle_table(n, &psi_inv, &q);

        let n_inv = Integer::from(n as u64)
            .invert(&q)
            .expect("n is invertible mod prime q");

        Self { n, q, psi_pow, psi_inv_pow, n_inv }
    }

    /// The ring dimension n.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// The modulus q.
    pub fn modulus(&self) -> &Integer {
        &self.q
    }

    /// Forward NTT in place. Input coefficients must lie in [0, q).
    pub fn forward(&self, a: &mut [Integer]) {
        assert_eq!(a.len(), self.n, "input length must match dimension");

        let n = self.n;
        let q = &self.q;
        let mut t = n;
        let mut m = 1;

        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let w = &self.psi_pow[m + i];

                for j in j1..j1 + t {
                    let v = Integer::from(&a[j + t] * w) % q;
                    let mut sum = Integer::from(&a[j] + &v);
                    if sum >= *q {
                        sum -= q;
                    }
                    let mut diff = std::mem::take(&mut a[j]);
                    diff -= &v;
                    if diff.cmp0() == std::cmp::Ordering::Less {
                        diff += q;
                    }
                    a[j] = sum;
                    a[j + t] = diff;
                }
            }
            m <<= 1;
        }
    }

    /// Inverse NTT in place. Output coefficients lie in [0, q).
    pub fn inverse(&self, a: &mut [Integer]) {
        assert_eq!(a.len(), self.n, "input length must match dimension");

        let n = self.n;
        let q = &self.q;
        let mut t = 1;
        let mut m = n;

        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let w = &self.psi_inv_pow[m + i];

                for j in j1..j1 + t {
                    let u = std::mem::take(&mut a[j]);
                    let v = std::mem::take(&mut a[j + t]);

                    let mut sum = Integer::from(&u + &v);
                    if sum >= *q {
                        sum -= q;
                    }
                    let mut diff = u;
                    diff -= &v;
                    if diff.cmp0() == std::cmp::Ordering::Less {
                        diff += q;
                    }
                    a[j] = sum;
                    a[j + t] = Integer::from(&diff * w) % q;
                }
            }
            t <<= 1;
        }

        for c in a.iter_mut() {
            let scaled = Integer::from(&*c * &self.n_inv) % q;
            *c = scaled;
        }
    }

    /// Find a primitive 2n-th root of unity ψ mod q.
    ///
    /// Tries small bases b and takes ψ = b^((q-1)/2n); the candidate is
    /// primitive exactly when ψ^n ≡ -1.
    fn find_primitive_root(n: usize, q: &Integer) -> Integer {
        let two_n = Integer::from(2 * n as u64);
        let exp = Integer::from(q - 1u32) / &two_n;
        let minus_one = Integer::from(q - 1u32);
        let n_int = Integer::from(n as u64);

        for b in 2u64.. {
            let candidate = pow_mod(&Integer::from(b), &exp, q);
            if pow_mod(&candidate, &n_int, q) == minus_one {
                return candidate;
            }
        }
        unreachable!("a primitive root exists for every prime q ≡ 1 (mod 2n)")
    }

    /// Build the twiddle table in bit-reversed order: entry m holds
    /// ψ^(n/(2m)) when m is a power of two, and products of those entries
    /// otherwise, so that the butterflies can index it as `table[m + i]`.
    fn twiddle_table(n: usize, psi: &Integer, q: &Integer) -> Vec<Integer> {
        let mut table = vec![Integer::new(); n];

        for m in 1..n {
            table[m] = if m.is_power_of_two() {
                pow_mod(psi, &Integer::from((n / (2 * m)) as u64), q)
            } else {
                let prev = m & (m - 1);
                let step = m & m.wrapping_neg();
                Integer::from(&table[prev] * &table[step]) % q
            };
        }
        table
    }
}
