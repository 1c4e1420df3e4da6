//! Graded (multilinear) encoding scheme over ideal lattices.
//!
//! An instance is generated for a security level λ and a multilinearity
//! degree κ; it supports encoding short ring elements at levels 0..=κ,
//! homomorphic addition within a level and multiplication across levels,
//! public re-randomization at the lowest level, and a public zero test
//! plus canonical bit extraction at the top level.
//!
//! ```no_run
//! use gghlite::{Encoding, Flags, SecretKey};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(1);
//! let sk = SecretKey::generate(20, 2, 1, Flags::default(), &mut rng)?;
//! let pk = sk.public_key();
//!
//! let a = Encoding::sample(pk, &mut rng).elevate(pk, 1, true, &mut rng)?;
//! let b = Encoding::sample(pk, &mut rng).elevate(pk, 1, true, &mut rng)?;
//! let product = a.mul(pk, &b)?;
//! let shared = product.extract(pk)?;
//! # let _ = shared;
//! # Ok::<(), gghlite::GghError>(())
//! ```

pub mod encoding;
pub mod error;
pub mod ideal;
pub mod keygen;
pub mod keys;
pub mod lattice;
pub mod math;
pub mod params;

pub use encoding::Encoding;
pub use error::{GghError, Result};
pub use keys::{PublicKey, SecretKey, Timings};
pub use math::{IntPoly, ModPoly};
pub use params::{Flags, Params};
