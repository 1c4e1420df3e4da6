//! Mathematical primitives: ring arithmetic, transforms, and sampling.

pub mod embed;
pub mod gaussian;
pub mod ntt;
pub mod poly;
pub mod rand;

pub use gaussian::{sample_wide, GaussianSampler, S_TO_SIGMA};
pub use ntt::NttContext;
pub use poly::{IntPoly, ModPoly};
