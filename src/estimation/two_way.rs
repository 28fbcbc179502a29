//! estimation::two_way — two-way fixed-effects least squares.
//!
//! Purpose
//! -------
//! Estimate `y = Xβ + α_entity + γ_period + ε` without an intercept by
//! applying the two-way within transform to `y` and every column of `X`,
//! then solving the normal equations of the demeaned problem.
//!
//! Key behaviors
//! -------------
//! - Guard identification before solving: at least one residual degree of
//!   freedom and a well-conditioned `X̃ᵀX̃` (eigenvalue check).
//! - Invert `X̃ᵀX̃` through its symmetric eigendecomposition; the inverse is
//!   reused as the bread of the Driscoll–Kraay sandwich.
//! - Report both residual conventions: original-space residuals `y − Xβ`
//!   and within (idiosyncratic) residuals `ỹ − X̃β`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Residual degrees of freedom are `N − K − N_entities − N_periods + 1`.
//! - Within R² is `1 − Σε̃² / Σỹ²`, reported as 0 when `ỹ` has no variation.
//!
//! Conventions
//! -----------
//! - Every identification failure is returned as
//!   `EstimationError::InsufficientData` carrying the design's horizon and
//!   label; nothing is masked.
use crate::{
    estimation::{
        design::DesignMatrix,
        errors::{EstimationError, EstimationResult},
        within::TwoWayDemeaner,
    },
    numerical_stability::{EIGEN_EPS, GENERAL_TOL, symmetrize},
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// TwoWayFit — coefficients and by-products of a two-way FE regression.
///
/// Fields
/// ------
/// - `beta`: length-`K` slope coefficients.
/// - `fitted`: `Xβ` in original (non-demeaned) space.
/// - `residuals`: `y − Xβ` in original space.
/// - `within_residuals`: `ỹ − X̃β`, the idiosyncratic residuals.
/// - `x_within`: demeaned regressors `X̃`.
/// - `gram_inv`: `(X̃ᵀX̃)⁻¹`.
/// - `df_resid`: residual degrees of freedom.
/// - `r2_within`: within R².
#[derive(Debug, Clone)]
pub struct TwoWayFit {
    pub beta: Array1<f64>,
    pub fitted: Array1<f64>,
    pub residuals: Array1<f64>,
    pub within_residuals: Array1<f64>,
    pub x_within: Array2<f64>,
    pub gram_inv: Array2<f64>,
    pub df_resid: usize,
    pub r2_within: f64,
}

/// Fit the two-way fixed-effects model on an assembled design.
///
/// Parameters
/// ----------
/// - `design`: `&DesignMatrix`
///   Listwise-complete rows with dense entity and period indices.
///
/// Returns
/// -------
/// `EstimationResult<TwoWayFit>`
///
/// Errors
/// ------
/// - `EstimationError::InsufficientData` when
///   - the design has no regressors or no more rows than regressors,
///   - `N − K − N_entities − N_periods + 1 < 1`,
///   - a regressor keeps at most `EIGEN_EPS` of its sum of squares after
///     the within transform (collinear with the fixed effects), or
///   - `λ_min(X̃ᵀX̃) ≤ EIGEN_EPS · λ_max`.
///
/// Both checks are ratios, so rescaling a regressor never changes whether
/// the design is identified.
pub fn fit_two_way(design: &DesignMatrix) -> EstimationResult<TwoWayFit> {
    let n = design.n_obs();
    let k = design.n_regressors();
    let insufficient = |reason: String| EstimationError::InsufficientData {
        horizon: design.horizon,
        configuration: design.label.clone(),
        reason,
    };

    if k == 0 {
        return Err(insufficient("design has no regressors".to_string()));
    }
    if n <= k {
        return Err(insufficient(format!("{n} usable rows for {k} regressors")));
    }
    let absorbed = k + design.n_entities + design.n_periods();
    if n + 1 <= absorbed {
        return Err(insufficient(format!(
            "no residual degrees of freedom ({n} rows, {k} regressors, {} entities, {} periods)",
            design.n_entities,
            design.n_periods()
        )));
    }
    let df_resid = n + 1 - absorbed;

    let demeaner =
        TwoWayDemeaner::new(&design.entity, &design.period, design.n_entities, design.n_periods());
    let y_within = demeaner.demean(design.y.view());
    let x_within = demeaner.demean_columns(&design.x);

    for (j, column) in x_within.columns().into_iter().enumerate() {
        let raw = design.x.column(j);
        if column.dot(&column) <= EIGEN_EPS * raw.dot(&raw) {
            return Err(insufficient(format!(
                "regressor `{}` is collinear with the fixed effects",
                design.names[j]
            )));
        }
    }

    let mut gram = x_within.t().dot(&x_within);
    symmetrize(&mut gram);
    let gram_inv = invert_gram(&gram).map_err(insufficient)?;

    let beta = gram_inv.dot(&x_within.t().dot(&y_within));
    let within_residuals = &y_within - &x_within.dot(&beta);
    let fitted = design.x.dot(&beta);
    let residuals = &design.y - &fitted;

    let ss_res = within_residuals.dot(&within_residuals);
    let ss_tot = y_within.dot(&y_within);
    let r2_within = if ss_tot > GENERAL_TOL { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(TwoWayFit {
        beta,
        fitted,
        residuals,
        within_residuals,
        x_within,
        gram_inv,
        df_resid,
        r2_within,
    })
}

// ---- Helper methods ----

/// Invert a symmetric positive-definite Gram matrix via `Q Λ⁻¹ Qᵀ`.
///
/// Returns a reason string when the smallest eigenvalue is not
/// distinguishable from zero relative to the largest.
fn invert_gram(gram: &Array2<f64>) -> Result<Array2<f64>, String> {
    let k = gram.nrows();
    let gram_nalg = DMatrix::<f64>::from_fn(k, k, |i, j| gram[[i, j]]);
    let eigen = gram_nalg.symmetric_eigen();
    let lambda_max = eigen.eigenvalues.max();
    let lambda_min = eigen.eigenvalues.min();
    if !lambda_min.is_finite() || lambda_min <= EIGEN_EPS * lambda_max {
        return Err(format!(
            "regressor matrix is rank-deficient after removing fixed effects \
             (eigenvalues {lambda_min:.3e} .. {lambda_max:.3e})"
        ));
    }
    let q = &eigen.eigenvectors;
    let mut inv = Array2::<f64>::zeros((k, k));
    for i in 0..k {
        for j in i..k {
            let v: f64 = (0..k).map(|m| q[(i, m)] * q[(j, m)] / eigen.eigenvalues[m]).sum();
            inv[[i, j]] = v;
            inv[[j, i]] = v;
        }
    }
    Ok(inv)
}
