//! Error handling for the graded encoding scheme.
//!
//! Only unrecoverable conditions surface as errors: misconfigured
//! parameters, capped rejection loops that failed to converge, level
//! overflow on checked encoding arithmetic, and negligible-probability
//! inversion failures (which indicate a parameterization bug rather than
//! a runtime condition to recover from). Ordinary sampling rejections
//! inside generation loops are not errors; they simply trigger another
//! draw.

use std::fmt;

/// Unrecoverable error of the graded encoding scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GghError {
    /// Invalid parameters, unsupported feature combinations, or violated
    /// structural preconditions. Never downgraded to a default.
    Config(String),

    /// A rejection-sampling loop exceeded the configured attempt cap
    /// without finding an acceptable candidate.
    DidNotConverge {
        /// Which generation step gave up.
        what: &'static str,
        /// Number of attempts made before giving up.
        attempts: u64,
    },

    /// Checked multiplication of two encodings whose combined level would
    /// exceed the multilinearity degree κ.
    LevelOverflow {
        /// Sum of the operand levels.
        level: usize,
        /// Multilinearity degree κ of the instance.
        kappa: usize,
    },

    /// A ring element that must be invertible modulo q was not. For
    /// correct parameters this has negligible probability.
    NotInvertible,
}

impl fmt::Display for GghError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GghError::Config(msg) => write!(f, "configuration error: {}", msg),
            GghError::DidNotConverge { what, attempts } => {
                write!(f, "{} did not converge after {} attempts", what, attempts)
            }
            GghError::LevelOverflow { level, kappa } => {
                write!(f, "encoding level {} exceeds multilinearity degree {}", level, kappa)
            }
            GghError::NotInvertible => write!(f, "ring element is not invertible mod q"),
        }
    }
}

impl std::error::Error for GghError {}

/// Result type for scheme operations.
pub type Result<T> = std::result::Result<T, GghError>;

/// Create a `GghError::Config` with format string support.
macro_rules! config_err {
    ($($arg:tt)*) => {
        $crate::error::GghError::Config(format!($($arg)*))
    };
}

pub(crate) use config_err;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = GghError::LevelOverflow { level: 5, kappa: 4 };
        assert_eq!(
            err.to_string(),
            "encoding level 5 exceeds multilinearity degree 4"
        );

        let err = GghError::DidNotConverge { what: "ideal generator", attempts: 100 };
        assert!(err.to_string().contains("100 attempts"));
    }

    #[test]
    fn test_config_macro() {
        let err = config_err!("kappa {} out of range", 99);
        assert_eq!(err.to_string(), "configuration error: kappa 99 out of range");
    }
}
