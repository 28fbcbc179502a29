//! diagnostics::outcome — completed-or-skipped wrapper for test results.
//!
//! Every sub-computation of the battery either completes with a structured
//! result or is recorded as skipped with the subject and the reason. Nothing
//! is dropped silently.
use crate::diagnostics::errors::{DiagnosticError, DiagnosticResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What was skipped and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    pub subject: String,
    pub reason: String,
}

impl SkipRecord {
    pub fn new(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        SkipRecord { subject: subject.into(), reason: reason.into() }
    }
}

/// Result of one diagnostic sub-computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiagnosticOutcome<T> {
    Completed(T),
    Skipped(SkipRecord),
}

impl<T> DiagnosticOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            DiagnosticOutcome::Completed(t) => Some(t),
            DiagnosticOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DiagnosticOutcome::Skipped(_))
    }

    /// Convert a skippable error into [`DiagnosticOutcome::Skipped`] and
    /// propagate every other error.
    pub fn settle(subject: impl Into<String>, result: DiagnosticResult<T>) -> DiagnosticResult<Self> {
        match result {
            Ok(value) => Ok(DiagnosticOutcome::Completed(value)),
            Err(err) if err.is_skippable() => {
                let subject = subject.into();
                let reason = skip_reason(&err);
                warn!(%subject, %reason, "diagnostic skipped");
                Ok(DiagnosticOutcome::Skipped(SkipRecord { subject, reason }))
            }
            Err(err) => Err(err),
        }
    }
}

fn skip_reason(err: &DiagnosticError) -> String {
    match err {
        DiagnosticError::DegenerateInput { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::errors::PanelError;

    #[test]
    fn settle_records_skips_and_propagates_fatal_errors() {
        let ok = DiagnosticOutcome::settle("wald", Ok(1.0)).unwrap();
        assert_eq!(ok.completed(), Some(&1.0));

        let skipped: DiagnosticOutcome<f64> = DiagnosticOutcome::settle(
            "cd h=0",
            Err(DiagnosticError::degenerate("pesaran_cd", "fewer than 2 entities")),
        )
        .unwrap();
        assert_eq!(
            skipped,
            DiagnosticOutcome::Skipped(SkipRecord::new("cd h=0", "fewer than 2 entities"))
        );

        let fatal = DiagnosticOutcome::<f64>::settle(
            "ips",
            Err(PanelError::UnknownVariable { name: "x".into() }.into()),
        );
        assert!(fatal.is_err());
    }
}
