//! diagnostics::unit_root — IPS-style panel unit-root approximation.
//!
//! Purpose
//! -------
//! Average per-entity augmented Dickey–Fuller t-statistics and standardize
//! the average with fixed asymptotic moments, in the spirit of Im, Pesaran
//! and Shin (2003).
//!
//! Key behaviors
//! -------------
//! - Per entity, the defined values of the variable (in time order, missing
//!   values dropped) form a series `y_0..y_{m−1}`. The ADF(1) regression
//!
//!   ```text
//!   Δy_t = a + ρ·y_{t−1} + b·Δy_{t−1} + e_t,   t = 2..m−1
//!   ```
//!
//!   is fit by least squares on `n = m − 2` rows with
//!   `σ² = RSS / (n − 3)`, and the t-statistic of `ρ` is recorded.
//! - Entities with fewer than [`MIN_OBSERVATIONS`] values are skipped, as
//!   are entities with no residual degrees of freedom (`m = 5`) or a
//!   singular design; every skip is listed with its reason.
//! - `Z = sqrt(N)·(t̄ − μ)/sqrt(v)` with `μ = −1.52`, `v = 0.74`, and the
//!   p-value is the left tail `Φ(Z)`.
//!
//! Conventions
//! -----------
//! - The moments `μ` and `v` are those tabulated for series of length
//!   about 20 and are applied whatever the actual length. The result is an
//!   approximation and is labelled as such.
use crate::{
    diagnostics::{
        errors::{DiagnosticError, DiagnosticResult},
        outcome::SkipRecord,
    },
    panel::data::Panel,
};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Minimum number of defined values for an entity to be used.
pub const MIN_OBSERVATIONS: usize = 5;
/// Approximate mean of the ADF t-statistic under the unit-root null.
pub const IPS_MEAN: f64 = -1.52;
/// Approximate variance of the ADF t-statistic under the unit-root null.
pub const IPS_VARIANCE: f64 = 0.74;

/// ADF(1) regression of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfRegression {
    pub entity: String,
    pub n_obs: usize,
    pub rho: f64,
    pub t_stat: f64,
}

/// IPS-style panel statistic for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpsTest {
    pub variable: String,
    pub t_bar: f64,
    pub z_stat: f64,
    pub p_value: f64,
    pub entities: Vec<AdfRegression>,
    pub skipped: Vec<SkipRecord>,
}

impl IpsTest {
    /// Whether the unit-root null is rejected at `level` (left tail).
    pub fn rejects_unit_root(&self, level: f64) -> bool {
        self.p_value < level
    }
}

/// Run the panel unit-root approximation on `variable`.
///
/// Errors
/// ------
/// - `DiagnosticError::Panel` if `variable` is unknown.
/// - `DiagnosticError::DegenerateInput` if no entity yields a t-statistic.
pub fn ips_test(panel: &Panel, variable: &str) -> DiagnosticResult<IpsTest> {
    let column = panel.series(variable)?;
    let mut entities = Vec::new();
    let mut skipped = Vec::new();
    for (e, name) in panel.entities().iter().enumerate() {
        let series: Vec<f64> = panel.entity_rows(e).filter_map(|row| column[row]).collect();
        match adf1(&series) {
            Ok((rho, t_stat)) => entities.push(AdfRegression {
                entity: name.clone(),
                n_obs: series.len(),
                rho,
                t_stat,
            }),
            Err(reason) => skipped.push(SkipRecord::new(name.clone(), reason)),
        }
    }
    if entities.is_empty() {
        return Err(DiagnosticError::degenerate(
            "ips_test",
            format!("no entity has a usable ADF regression for `{variable}`"),
        ));
    }

    let n = entities.len() as f64;
    let t_bar = entities.iter().map(|a| a.t_stat).sum::<f64>() / n;
    let z_stat = n.sqrt() * (t_bar - IPS_MEAN) / IPS_VARIANCE.sqrt();
    let p_value = Normal::new(0.0, 1.0)
        .map(|d| d.cdf(z_stat))
        .map_err(|e| DiagnosticError::degenerate("ips_test", e.to_string()))?;
    Ok(IpsTest { variable: variable.to_string(), t_bar, z_stat, p_value, entities, skipped })
}

// ---- Helper methods ----

/// ADF(1) with intercept; returns `(ρ̂, t(ρ̂))` or the reason it failed.
fn adf1(y: &[f64]) -> Result<(f64, f64), String> {
    let m = y.len();
    if m < MIN_OBSERVATIONS {
        return Err(format!("{m} observations; at least {MIN_OBSERVATIONS} are required"));
    }
    let n = m - 2;
    if n <= 3 {
        return Err(format!("{m} observations leave no residual degrees of freedom"));
    }

    let mut xtx = Matrix3::<f64>::zeros();
    let mut xty = Vector3::<f64>::zeros();
    let rows: Vec<(Vector3<f64>, f64)> = (2..m)
        .map(|t| (Vector3::new(1.0, y[t - 1], y[t - 1] - y[t - 2]), y[t] - y[t - 1]))
        .collect();
    for (x, dy) in &rows {
        xtx += x * x.transpose();
        xty += x * *dy;
    }
    let inv = xtx.try_inverse().ok_or_else(|| "singular ADF design".to_string())?;
    let beta = inv * xty;
    let rss: f64 = rows.iter().map(|(x, dy)| (dy - x.dot(&beta)).powi(2)).sum();
    let sigma2 = rss / (n - 3) as f64;
    let var_rho = sigma2 * inv[(1, 1)];
    if !(var_rho > 0.0) || !var_rho.is_finite() {
        return Err("zero residual variance in ADF regression".to_string());
    }
    Ok((beta[1], beta[1] / var_rho.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::data::Observation;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Skipping of short series and of the zero-dof boundary.
    // - Strong mean reversion producing a large negative t̄ and a small
    //   left-tail p-value.
    // - The standardization formula.
    // -------------------------------------------------------------------------

    /// Deterministic zig-zag with slight irregularity: strongly mean reverting.
    fn reverting(len: usize, phase: f64) -> Vec<f64> {
        (0..len)
            .map(|t| {
                let sign = if t % 2 == 0 { 1.0 } else { -1.0 };
                sign * (1.0 + 0.3 * ((t as f64 + phase) * 1.3).sin())
            })
            .collect()
    }

    fn panel(series: &[(&str, Vec<f64>)]) -> Panel {
        let mut obs = Vec::new();
        for (e, values) in series {
            for (t, v) in values.iter().enumerate() {
                obs.push(Observation::new(*e, 2000 + t as i64).with("x", *v));
            }
        }
        Panel::from_observations(obs).unwrap()
    }

    #[test]
    fn short_series_are_skipped_with_reasons() {
        assert!(adf1(&[1.0, 2.0, 3.0, 4.0]).unwrap_err().contains("at least 5"));
        assert!(adf1(&[1.0, 2.0, 0.0, 4.0, 3.0]).unwrap_err().contains("degrees of freedom"));
    }

    #[test]
    // Purpose
    // -------
    // Mean-reverting series reject the unit-root null; entities that are
    // too short are listed as skipped rather than dropped.
    fn mean_reverting_panel_rejects_unit_root() {
        // Arrange
        let panel = panel(&[
            ("A", reverting(20, 0.0)),
            ("B", reverting(20, 1.0)),
            ("C", reverting(20, 2.5)),
            ("D", vec![1.0, 2.0, 3.0]),
        ]);

        // Act
        let ips = ips_test(&panel, "x").unwrap();

        // Assert
        assert_eq!(ips.entities.len(), 3);
        assert_eq!(ips.skipped.len(), 1);
        assert_eq!(ips.skipped[0].subject, "D");
        assert!(ips.t_bar < -3.0, "t_bar = {}", ips.t_bar);
        assert!(ips.rejects_unit_root(0.05));
        let z = 3.0_f64.sqrt() * (ips.t_bar + 1.52) / 0.74_f64.sqrt();
        assert_relative_eq!(ips.z_stat, z, epsilon = 1e-12);
    }

    #[test]
    fn all_entities_too_short_is_degenerate() {
        let panel = panel(&[("A", vec![1.0, 2.0]), ("B", vec![0.0, 1.0, 0.5])]);
        assert!(ips_test(&panel, "x").unwrap_err().is_skippable());
        assert!(matches!(ips_test(&panel, "nope"), Err(DiagnosticError::Panel(_))));
    }
}
