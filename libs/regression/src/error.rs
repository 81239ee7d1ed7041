//! Error types for regression configuration

use thiserror::Error;

/// Rejected [`KernelSpec`](crate::KernelSpec) parameters.
///
/// Only construction can fail. Numeric edge cases during calculation (too few bars,
/// zero denominators) surface as `NaN` values instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegressionError {
    #[error("Bandwidth must be at least 1 bar, got {0}")]
    InvalidBandwidth(usize),

    #[error("Deviation multiplier must be finite and non-negative, got {0}")]
    InvalidDeviation(f64),
}

pub type Result<T> = std::result::Result<T, RegressionError>;
