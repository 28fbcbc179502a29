//! Unified error handling for covariance estimation.
//!
//! This module defines `InferenceError`, the error type used by the
//! Driscoll–Kraay moment aggregation and sandwich routines. Dimension
//! mismatches between the design, the residuals, and the period index are
//! the only failure modes; numerical degeneracy of the Gram matrix is
//! detected earlier, in the estimator.
use thiserror::Error;

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Two inputs that must be conformable are not.
    #[error("Inference Error: {what} has length {found}, expected {expected}")]
    DimensionMismatch { what: &'static str, expected: usize, found: usize },

    /// A row refers to a period index outside `0..n_periods`.
    #[error("Inference Error: period index {index} out of range for {n_periods} periods")]
    PeriodOutOfRange { index: usize, n_periods: usize },

    /// No periods (and hence no moments) were supplied.
    #[error("Inference Error: at least one time period is required")]
    NoPeriods,
}

pub type InferenceResult<T> = Result<T, InferenceError>;
