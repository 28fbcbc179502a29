//! projection::horizon — per-horizon regression records.
//!
//! Purpose
//! -------
//! Hold the immutable output of one horizon's regression: coefficients with
//! Driscoll–Kraay standard errors and normal-reference p-values, the
//! covariance matrix, both residual series keyed by `(entity, time)`, and
//! fit statistics.
//!
//! Conventions
//! -----------
//! - p-values are two-sided against the standard normal:
//!   `p = 2·(1 − Φ(|z|))`, `z = estimate / std_error`.
//! - A zero standard error yields `z = ±∞` and `p = 0` for a non-zero
//!   estimate, and `z = 0`, `p = 1` for a zero estimate.
use crate::{inference::driscoll_kraay::BandwidthSource, panel::data::PanelKey};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Estimate, standard error, z statistic and p-value of one coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientEstimate {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z_stat: f64,
    pub p_value: f64,
}

impl CoefficientEstimate {
    pub fn new(name: impl Into<String>, estimate: f64, std_error: f64) -> Self {
        let z_stat = if std_error > 0.0 {
            estimate / std_error
        } else if estimate == 0.0 {
            0.0
        } else {
            estimate.signum() * f64::INFINITY
        };
        CoefficientEstimate {
            name: name.into(),
            estimate,
            std_error,
            z_stat,
            p_value: normal_two_sided_p(z_stat),
        }
    }

    /// Whether the two-sided p-value is below `level`.
    pub fn is_significant(&self, level: f64) -> bool {
        self.p_value < level
    }

    /// `(estimate − m·se, estimate + m·se)`.
    pub fn band(&self, multiplier: f64) -> (f64, f64) {
        (self.estimate - multiplier * self.std_error, self.estimate + multiplier * self.std_error)
    }
}

/// Two-sided standard-normal p-value of `z`.
pub fn normal_two_sided_p(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(std_normal) => (2.0 * std_normal.sf(z.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// Residuals of one row.
///
/// - `residual`: original-space residual `y − Xβ` (still contains the fixed
///   effects).
/// - `within_residual`: idiosyncratic residual after the two-way transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedResidual {
    pub key: PanelKey,
    pub residual: f64,
    pub within_residual: f64,
}

/// HorizonResult — output of the regression at one horizon.
///
/// Fields
/// ------
/// - `horizon`: `h`.
/// - `coefficients`: one [`CoefficientEstimate`] per regressor, in design
///   order (shock first).
/// - `covariance`: Driscoll–Kraay covariance of all coefficients.
/// - `residuals`: per-row residuals in `(entity, time)` order.
/// - `n_obs`, `n_entities`, `n_periods`: sample dimensions after listwise
///   deletion.
/// - `df_resid`: `N − K − N_entities − N_periods + 1`.
/// - `r2_within`: within R².
/// - `bandwidth`, `bandwidth_source`: effective Driscoll–Kraay bandwidth and
///   its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonResult {
    pub horizon: usize,
    pub coefficients: Vec<CoefficientEstimate>,
    pub covariance: Array2<f64>,
    pub residuals: Vec<KeyedResidual>,
    pub n_obs: usize,
    pub n_entities: usize,
    pub n_periods: usize,
    pub df_resid: usize,
    pub r2_within: f64,
    pub bandwidth: usize,
    pub bandwidth_source: BandwidthSource,
}

impl HorizonResult {
    pub fn coefficient(&self, name: &str) -> Option<&CoefficientEstimate> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Shock coefficient (always the first regressor).
    pub fn shock(&self) -> &CoefficientEstimate {
        &self.coefficients[0]
    }
}

/// Record of a horizon whose regression was not identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonFailure {
    pub horizon: usize,
    pub configuration: String,
    pub reason: String,
}

/// Outcome of one horizon: estimated, or failed with insufficient data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HorizonOutcome {
    Estimated(HorizonResult),
    Failed(HorizonFailure),
}

impl HorizonOutcome {
    pub fn horizon(&self) -> usize {
        match self {
            HorizonOutcome::Estimated(r) => r.horizon,
            HorizonOutcome::Failed(f) => f.horizon,
        }
    }

    pub fn estimated(&self) -> Option<&HorizonResult> {
        match self {
            HorizonOutcome::Estimated(r) => Some(r),
            HorizonOutcome::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Normal-reference p-values match textbook quantiles.
    fn p_values_use_two_sided_standard_normal() {
        let c = CoefficientEstimate::new("fe", 1.959_963_984_540_054, 1.0);
        assert_relative_eq!(c.p_value, 0.05, epsilon = 1e-9);
        assert_relative_eq!(normal_two_sided_p(0.0), 1.0, epsilon = 1e-15);
        assert_relative_eq!(normal_two_sided_p(-1.644_853_626_951_472_2), 0.10, epsilon = 1e-9);
        assert!(c.is_significant(0.10));
        assert!(!c.is_significant(0.01));
    }

    #[test]
    fn zero_standard_error_is_handled_without_nan() {
        let exact = CoefficientEstimate::new("fe", 1.0, 0.0);
        assert_eq!(exact.z_stat, f64::INFINITY);
        assert_eq!(exact.p_value, 0.0);
        let null = CoefficientEstimate::new("fe", 0.0, 0.0);
        assert_eq!(null.p_value, 1.0);
    }

    #[test]
    fn band_is_symmetric_multiple_of_std_error() {
        let c = CoefficientEstimate::new("fe", 2.0, 0.5);
        assert_eq!(c.band(1.0), (1.5, 2.5));
        assert_eq!(c.band(1.96), (2.0 - 0.98, 2.0 + 0.98));
    }
}
