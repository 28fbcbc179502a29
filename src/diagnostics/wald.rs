//! diagnostics::wald — joint Wald test with a block-diagonal covariance.
//!
//! Purpose
//! -------
//! Test `H0: θ_1 = … = θ_m = 0` from separately estimated coefficients.
//! Local projections estimate one equation per horizon, so the covariance
//! across horizons is approximated as diagonal:
//!
//! ```text
//! W = Σ_j (θ_j / se_j)²  ~  χ²(m)  under H0
//! ```
//!
//! Key behaviors
//! -------------
//! - [`joint_wald`] works on any list of coefficient estimates (interaction
//!   terms across horizons, or lag terms of one regression).
//! - [`interaction_wald`] collects the interaction coefficient of every
//!   horizon of an [`Irf`].
use crate::{
    diagnostics::errors::{DiagnosticError, DiagnosticResult},
    projection::{horizon::CoefficientEstimate, irf::Irf},
};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Joint Wald statistic, its χ² reference, and the per-term detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaldTest {
    pub statistic: f64,
    pub df: usize,
    pub p_value: f64,
    pub terms: Vec<CoefficientEstimate>,
}

impl WaldTest {
    pub fn rejects(&self, level: f64) -> bool {
        self.p_value < level
    }
}

/// Joint Wald test over independent coefficient estimates.
///
/// Errors
/// ------
/// - `DiagnosticError::DegenerateInput` if `terms` is empty or a standard
///   error is not strictly positive.
pub fn joint_wald(terms: &[CoefficientEstimate]) -> DiagnosticResult<WaldTest> {
    if terms.is_empty() {
        return Err(DiagnosticError::degenerate("joint_wald", "no coefficients to test"));
    }
    if let Some(bad) = terms.iter().find(|t| !(t.std_error > 0.0) || !t.std_error.is_finite()) {
        return Err(DiagnosticError::degenerate(
            "joint_wald",
            format!("coefficient `{}` has standard error {}", bad.name, bad.std_error),
        ));
    }
    let statistic: f64 = terms.iter().map(|t| (t.estimate / t.std_error).powi(2)).sum();
    let df = terms.len();
    let chi2 = ChiSquared::new(df as f64)
        .map_err(|e| DiagnosticError::degenerate("joint_wald", e.to_string()))?;
    Ok(WaldTest { statistic, df, p_value: 1.0 - chi2.cdf(statistic), terms: terms.to_vec() })
}

/// Joint significance of the interaction term across all horizons.
///
/// Errors
/// ------
/// - `DiagnosticError::MissingModerator` if the IRF has no interaction.
/// - `DiagnosticError::Projection` (skippable) if a horizon failed.
/// - As [`joint_wald`].
pub fn interaction_wald(irf: &Irf) -> DiagnosticResult<WaldTest> {
    let name = irf
        .config
        .interaction_name()
        .ok_or(DiagnosticError::MissingModerator { test: "interaction_wald" })?;
    let terms: Vec<CoefficientEstimate> = irf.coefficients(&name)?.into_iter().cloned().collect();
    joint_wald(&terms)
}
