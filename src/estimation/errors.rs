//! estimation::errors — error type for design assembly and two-way FE fits.
//!
//! Purpose
//! -------
//! Distinguish the horizon-local failure of an under-identified regression
//! from configuration errors raised by the panel layer and conformability
//! errors raised by the covariance layer.
//!
//! Conventions
//! -----------
//! - [`EstimationError::InsufficientData`] is fatal for one regression
//!   only. Callers that loop over horizons record it and move on.
//! - [`EstimationError::Panel`] wraps unknown-variable lookups and must be
//!   surfaced to the caller immediately.
use crate::{inference::errors::InferenceError, panel::errors::PanelError};
use thiserror::Error;

/// Unified error type for the estimation layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    /// The design cannot identify its coefficients: too few usable rows,
    /// no residual degrees of freedom, or a rank-deficient regressor matrix
    /// after removing the fixed effects.
    #[error("Estimation Error: insufficient data at horizon {horizon} ({configuration}): {reason}")]
    InsufficientData { horizon: usize, configuration: String, reason: String },

    /// A variable could not be resolved or the panel is malformed.
    #[error(transparent)]
    Panel(#[from] PanelError),

    /// Inputs to the covariance estimator were not conformable.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl EstimationError {
    /// Whether this error only invalidates the current regression.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, EstimationError::InsufficientData { .. })
    }
}

pub type EstimationResult<T> = Result<T, EstimationError>;
