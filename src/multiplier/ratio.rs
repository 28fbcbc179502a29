//! multiplier::ratio — ratio multiplier with delta-method uncertainty.
//!
//! Purpose
//! -------
//! Combine a cumulative outcome response `X_h` and a cumulative ratio
//! response `R_h` into the multiplier
//!
//! ```text
//! D_h = max(R_h + w·X_h, ε),   M_h = X_h / D_h,   ε = 1e-12
//! ```
//!
//! and propagate the band-implied standard errors of `X_h` and `R_h`
//! through `M` by the delta method, treating `X_h` and `R_h` as independent:
//!
//! ```text
//! ∂M/∂X = R/D²,  ∂M/∂R = −X/D²
//! se(M) = sqrt((R/D²)²·se(X)² + (X/D²)²·se(R)²)
//! ```
//!
//! Key behaviors
//! -------------
//! - A denominator below `ε` is clamped, never rejected; each row reports
//!   whether the clamp was active.
//! - Reported bands are `M_h ± se(M_h)`: one standard error, not a
//!   confidence interval.
//!
//! Conventions
//! -----------
//! - The gradient formulas are applied at the clamped denominator as well.
use crate::{
    multiplier::{
        cumulative::se_from_bands,
        errors::{MultiplierError, MultiplierResult},
    },
    numerical_stability::clamp_denominator,
    projection::irf::BandPath,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One horizon of the multiplier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierRow {
    pub horizon: usize,
    pub multiplier: f64,
    pub low: f64,
    pub high: f64,
    pub std_error: f64,
    pub denominator: f64,
    pub denominator_clamped: bool,
}

/// MultiplierTable — per-horizon multipliers and their share weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub weight: f64,
    pub rows: Vec<MultiplierRow>,
}

impl MultiplierTable {
    pub fn multipliers(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.multiplier).collect()
    }
}

/// Partial derivatives of `M(X, R) = X / max(R + w·X, ε)`.
///
/// Returns `(∂M/∂X, ∂M/∂R, D, clamped)`.
pub fn multiplier_gradient(x: f64, r: f64, weight: f64) -> (f64, f64, f64, bool) {
    let (d, clamped) = clamp_denominator(r + weight * x);
    let d2 = d * d;
    (r / d2, -x / d2, d, clamped)
}

/// Build the multiplier table from cumulative outcome and ratio paths.
///
/// Parameters
/// ----------
/// - `outcome_cum`: cumulative outcome path `X` with bands (already scaled,
///   e.g. to percent).
/// - `ratio_cum`: cumulative ratio path `R` with bands.
/// - `weight`: mean share `w` on the `[0, 1]` scale.
///
/// Errors
/// ------
/// - `MultiplierError::LengthMismatch` if the paths cover different numbers
///   of horizons.
/// - `MultiplierError::InvalidWeight` if `weight` is not finite.
pub fn multiplier(
    outcome_cum: &BandPath, ratio_cum: &BandPath, weight: f64,
) -> MultiplierResult<MultiplierTable> {
    if !weight.is_finite() {
        return Err(MultiplierError::InvalidWeight { value: weight });
    }
    if ratio_cum.len() != outcome_cum.len() {
        return Err(MultiplierError::LengthMismatch {
            what: "ratio path",
            expected: outcome_cum.len(),
            found: ratio_cum.len(),
        });
    }
    let se_x = se_from_bands(&outcome_cum.mean, &outcome_cum.low, &outcome_cum.high)?;
    let se_r = se_from_bands(&ratio_cum.mean, &ratio_cum.low, &ratio_cum.high)?;

    let rows = (0..outcome_cum.len())
        .map(|i| {
            let x = outcome_cum.mean[i];
            let r = ratio_cum.mean[i];
            let (dm_dx, dm_dr, d, clamped) = multiplier_gradient(x, r, weight);
            let horizon = outcome_cum.horizons[i];
            if clamped {
                warn!(horizon, denominator = r + weight * x, "multiplier denominator clamped");
            }
            let m = x / d;
            let se = ((dm_dx * se_x[i]).powi(2) + (dm_dr * se_r[i]).powi(2)).sqrt();
            MultiplierRow {
                horizon,
                multiplier: m,
                low: m - se,
                high: m + se,
                std_error: se,
                denominator: d,
                denominator_clamped: clamped,
            }
        })
        .collect();
    Ok(MultiplierTable { weight, rows })
}
