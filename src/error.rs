//! Estimation errors.
//!
//! Index and dimension errors are caller contract breaches, they are detected before any part of the
//! state is written. Numeric errors leave the state as it was before the failing call.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    #[error("index {index} out of range for state of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("index set not strictly increasing at position {position}")]
    NotIncreasing { position: usize },

    #[error("index set not contained in its bound: {0}")]
    NotSubset(&'static str),

    #[error("index sets overlap: {0}")]
    Overlapping(&'static str),

    #[error("dimension mismatch for {what}: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("covariance not invertible: {0}")]
    NotInvertible(&'static str),

    #[error("covariance not PSD: {0}")]
    NotPSD(&'static str),
}

pub type EstimateResult<T> = Result<T, EstimateError>;

/// Check that a matrix has the shape expected by an operation.
pub(crate) fn check_shape(what: &'static str, expected: (usize, usize), found: (usize, usize)) -> EstimateResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(EstimateError::DimensionMismatch { what, expected, found })
    }
}
