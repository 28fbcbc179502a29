//! projection::errors — configuration and orchestration errors.
//!
//! Purpose
//! -------
//! Separate errors that invalidate a whole projection run (bad
//! configuration, unknown variables) from horizon-local estimation failures,
//! which are recorded inside the [`Irf`](crate::projection::Irf) instead of
//! being raised.
use crate::{
    estimation::errors::EstimationError, inference::errors::InferenceError,
    panel::errors::PanelError,
};
use thiserror::Error;

/// Invalid [`LpConfig`](crate::projection::LpConfig) values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Config Error: `{field}` must name a variable.")]
    EmptyName { field: &'static str },

    #[error("Config Error: band multiplier must be finite and non-negative, got {value}.")]
    InvalidBandMultiplier { value: f64 },

    #[error("Config Error: moderator lag must be at least 1 to be predetermined, got {lag}.")]
    ModeratorLag { lag: usize },

    #[error("Config Error: `{name}` appears more than once in the control list.")]
    DuplicateControl { name: String },
}

/// Errors that abort a projection run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Panel(#[from] PanelError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// An operation needed a horizon that failed to estimate.
    #[error("Projection Error: horizon {horizon} was not estimated: {reason}")]
    MissingHorizon { horizon: usize, reason: String },

    /// An operation needed a coefficient the configuration does not produce.
    #[error("Projection Error: no coefficient `{name}` in the horizon results.")]
    UnknownCoefficient { name: String },
}

impl From<EstimationError> for ProjectionError {
    /// Non-horizon-local estimation errors surface as their underlying
    /// cause. Insufficient data is reported as a missing horizon.
    fn from(err: EstimationError) -> Self {
        match err {
            EstimationError::Panel(e) => ProjectionError::Panel(e),
            EstimationError::Inference(e) => ProjectionError::Inference(e),
            EstimationError::InsufficientData { horizon, reason, .. } => {
                ProjectionError::MissingHorizon { horizon, reason }
            }
        }
    }
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;
