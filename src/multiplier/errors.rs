//! multiplier::errors — error type for cumulative paths and multipliers.
use crate::{panel::errors::PanelError, projection::errors::ProjectionError};
use thiserror::Error;

/// Unified error type for the multiplier layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MultiplierError {
    /// Two paths that must cover the same horizons do not.
    #[error("Multiplier Error: {what} has {found} horizons, expected {expected}")]
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    /// The share variable has no defined value in the panel.
    #[error("Multiplier Error: share variable `{variable}` has no defined values")]
    EmptyShare { variable: String },

    /// The share weight is not a finite number.
    #[error("Multiplier Error: share weight must be finite, got {value}")]
    InvalidWeight { value: f64 },

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Panel(#[from] PanelError),
}

pub type MultiplierResult<T> = Result<T, MultiplierError>;
