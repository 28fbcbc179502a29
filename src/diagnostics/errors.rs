//! diagnostics::errors — error type for the specification-test battery.
//!
//! Purpose
//! -------
//! Separate degenerate test inputs, which the battery converts into explicit
//! skipped records, from configuration errors, which abort it.
//!
//! Conventions
//! -----------
//! - [`DiagnosticError::DegenerateInput`] and horizon-local
//!   [`EstimationError::InsufficientData`] are *skippable*: see
//!   [`DiagnosticError::is_skippable`].
//! - Unknown variables and invalid configurations are fatal.
use crate::{
    estimation::errors::EstimationError, inference::errors::InferenceError,
    multiplier::errors::MultiplierError, panel::errors::PanelError,
    projection::errors::ProjectionError,
};
use thiserror::Error;

/// Unified error type for diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticError {
    /// The input cannot support the statistic (too few entities, pairs,
    /// observations, or a zero standard error).
    #[error("Diagnostic Error: {test} skipped: {reason}")]
    DegenerateInput { test: &'static str, reason: String },

    /// A test that needs an interaction term was given a configuration
    /// without a moderator.
    #[error("Diagnostic Error: {test} requires a moderator in the configuration")]
    MissingModerator { test: &'static str },

    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Panel(#[from] PanelError),

    #[error(transparent)]
    Multiplier(#[from] MultiplierError),
}

impl DiagnosticError {
    pub(crate) fn degenerate(test: &'static str, reason: impl Into<String>) -> Self {
        DiagnosticError::DegenerateInput { test, reason: reason.into() }
    }

    /// Whether the battery should record this error as a skipped check.
    pub fn is_skippable(&self) -> bool {
        match self {
            DiagnosticError::DegenerateInput { .. } => true,
            DiagnosticError::Estimation(e) => e.is_insufficient_data(),
            DiagnosticError::Projection(ProjectionError::MissingHorizon { .. }) => true,
            DiagnosticError::Multiplier(MultiplierError::Projection(
                ProjectionError::MissingHorizon { .. },
            )) => true,
            _ => false,
        }
    }
}

pub type DiagnosticResult<T> = Result<T, DiagnosticError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_inputs_and_missing_horizons_are_skippable() {
        assert!(DiagnosticError::degenerate("pesaran_cd", "N = 1").is_skippable());
        let missing: DiagnosticError =
            ProjectionError::MissingHorizon { horizon: 1, reason: "rank".into() }.into();
        assert!(missing.is_skippable());
        let unknown: DiagnosticError = PanelError::UnknownVariable { name: "GE".into() }.into();
        assert!(!unknown.is_skippable());
        assert!(!DiagnosticError::MissingModerator { test: "wald" }.is_skippable());
    }
}
