//! inference::driscoll_kraay — cross-sectionally and serially robust covariance.
//!
//! Purpose
//! -------
//! Build the Driscoll–Kraay (1998) covariance of a least-squares coefficient
//! vector estimated on a panel. Shared macro shocks make residuals of
//! different entities in the same period correlated; aggregating moments
//! per period before applying a HAC long-run variance makes the estimator
//! robust to that cross-sectional dependence, to heteroskedasticity, and
//! to serial correlation up to the bandwidth `L`.
//!
//! ```text
//! h_t  = Σ_i x̃_it ε̃_it                        (one K-vector per period)
//! Γ_k  = Σ_{t=k}^{T-1} h_t h_{t−k}ᵀ
//! S    = Γ₀ + Σ_{k=1}^{L} w_k (Γ_k + Γ_kᵀ)
//! V(β̂) = c · (X̃ᵀX̃)⁻¹ S (X̃ᵀX̃)⁻¹
//! ```
//!
//! with `w_k = kernel.weight(k/(L+1))` and `c = N/df` when the small-sample
//! correction is enabled, `c = 1` otherwise.
//!
//! Key behaviors
//! -------------
//! - [`period_moments`] collapses the `N×K` score contributions into a
//!   `T×K` moment series, independent of the number of entities.
//! - [`long_run_variance`] accumulates the kernel-weighted autocovariances
//!   of that series.
//! - [`driscoll_kraay`] resolves the bandwidth (override or rule), truncates
//!   it to `T−1`, and returns the sandwich together with the bandwidth
//!   actually used and where it came from.
//!
//! Invariants & assumptions
//! ------------------------
//! - `x` and `residuals` are the *within-transformed* regressors and
//!   residuals; `gram_inv` is the inverse of `x̃ᵀx̃`.
//! - Period indices are dense (`0..T`) and chronological: consecutive
//!   indices are treated as adjacent periods.
//! - With `T = 1` no lag term exists and `S = Γ₀`; with `L = 0` only the
//!   contemporaneous cross-sectional term contributes.
//!
//! Conventions
//! -----------
//! - Autocovariances are sums over periods (no `1/T` factor), matching the
//!   unscaled `(X̃ᵀX̃)⁻¹` bread.
//! - The returned covariance is explicitly symmetrized.
//!
//! Testing notes
//! -------------
//! - Unit tests compare [`long_run_variance`] against a hand-written
//!   Bartlett sum, check the single-period and zero-bandwidth collapses,
//!   and verify the moment aggregation on a tiny panel.
use crate::{
    inference::{
        errors::{InferenceError, InferenceResult},
        kernel::{BandwidthRule, KernelType},
    },
    numerical_stability::symmetrize,
};
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};
use std::cmp::min;

/// DriscollKraayOptions — configuration of the robust covariance.
///
/// Fields
/// ------
/// - `kernel`: [`KernelType`]
///   Taper for the lagged autocovariances (default Bartlett).
/// - `bandwidth`: `Option<usize>`
///   Explicit bandwidth override. `None` selects `rule`.
/// - `rule`: [`BandwidthRule`]
///   Default-bandwidth rule (default Newey–West, `⌊4 (T/100)^{2/9}⌋`).
/// - `small_sample_correction`: `bool`
///   Multiply the sandwich by `N/df` (default `true`).
///
/// Notes
/// -----
/// - The effective bandwidth is always truncated to `T − 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriscollKraayOptions {
    pub kernel: KernelType,
    pub bandwidth: Option<usize>,
    pub rule: BandwidthRule,
    pub small_sample_correction: bool,
}

impl DriscollKraayOptions {
    pub fn new(
        bandwidth: Option<usize>, kernel: KernelType, rule: BandwidthRule,
        small_sample_correction: bool,
    ) -> Self {
        DriscollKraayOptions { kernel, bandwidth, rule, small_sample_correction }
    }

    /// Same options with a fixed bandwidth.
    pub fn with_bandwidth(mut self, bandwidth: usize) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    /// Same options with the `N/df` correction switched on or off.
    pub fn with_small_sample_correction(mut self, enabled: bool) -> Self {
        self.small_sample_correction = enabled;
        self
    }

    /// Resolve the effective bandwidth for `n_periods` periods.
    pub fn resolve_bandwidth(&self, n_periods: usize) -> (usize, BandwidthSource) {
        let max_lag = n_periods.saturating_sub(1);
        match self.bandwidth {
            Some(bw) => (min(bw, max_lag), BandwidthSource::Override),
            None => (min(self.rule.bandwidth(n_periods), max_lag), BandwidthSource::Rule(self.rule)),
        }
    }
}

impl Default for DriscollKraayOptions {
    /// Bartlett kernel, Newey–West bandwidth rule, `N/df` correction.
    ///
    /// This is the convention of the common panel-regression packages when
    /// they are asked for Driscoll–Kraay errors without a bandwidth.
    fn default() -> Self {
        Self {
            kernel: KernelType::Bartlett,
            bandwidth: None,
            rule: BandwidthRule::NeweyWest,
            small_sample_correction: true,
        }
    }
}

/// Where the effective bandwidth came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandwidthSource {
    Override,
    Rule(BandwidthRule),
}

/// DriscollKraayCovariance — sandwich covariance and its provenance.
///
/// Fields
/// ------
/// - `covariance`: `K×K` symmetric covariance of `β̂`.
/// - `std_errors`: square roots of the diagonal (negative rounding noise
///   is floored at zero).
/// - `bandwidth`: effective bandwidth `L` after truncation.
/// - `bandwidth_source`: override or the rule that produced `L`.
/// - `kernel`: taper used.
/// - `n_periods`: number of periods `T` in the moment series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriscollKraayCovariance {
    pub covariance: Array2<f64>,
    pub std_errors: Array1<f64>,
    pub bandwidth: usize,
    pub bandwidth_source: BandwidthSource,
    pub kernel: KernelType,
    pub n_periods: usize,
}

/// Compute the Driscoll–Kraay covariance of `β̂`.
///
/// Parameters
/// ----------
/// - `x`: `&Array2<f64>`
///   `N×K` within-transformed regressors.
/// - `residuals`: `&Array1<f64>`
///   Length-`N` within residuals `ε̃`.
/// - `period_of`: `&[usize]`
///   Dense period index of each row, in `0..n_periods`.
/// - `n_periods`: `usize`
///   Number of periods `T ≥ 1`.
/// - `gram_inv`: `&Array2<f64>`
///   `K×K` inverse of `x̃ᵀx̃`.
/// - `df_resid`: `usize`
///   Residual degrees of freedom, used only by the small-sample correction.
/// - `opts`: `&DriscollKraayOptions`
///
/// Returns
/// -------
/// `InferenceResult<DriscollKraayCovariance>`
///
/// Errors
/// ------
/// - `InferenceError::NoPeriods` if `n_periods == 0`.
/// - `InferenceError::DimensionMismatch` for non-conformable inputs.
/// - `InferenceError::PeriodOutOfRange` for an invalid period index.
pub fn driscoll_kraay(
    x: &Array2<f64>, residuals: &Array1<f64>, period_of: &[usize], n_periods: usize,
    gram_inv: &Array2<f64>, df_resid: usize, opts: &DriscollKraayOptions,
) -> InferenceResult<DriscollKraayCovariance> {
    let k = x.ncols();
    if gram_inv.nrows() != k || gram_inv.ncols() != k {
        return Err(InferenceError::DimensionMismatch {
            what: "inverse Gram matrix",
            expected: k,
            found: gram_inv.nrows(),
        });
    }

    let moments = period_moments(x, residuals, period_of, n_periods)?;
    let (bandwidth, bandwidth_source) = opts.resolve_bandwidth(n_periods);
    let meat = long_run_variance(&moments, bandwidth, &opts.kernel);

    let mut covariance = gram_inv.dot(&meat).dot(gram_inv);
    if opts.small_sample_correction && df_resid > 0 {
        covariance *= x.nrows() as f64 / df_resid as f64;
    }
    symmetrize(&mut covariance);
    let std_errors = covariance.diag().mapv(|v| v.max(0.0).sqrt());

    Ok(DriscollKraayCovariance {
        covariance,
        std_errors,
        bandwidth,
        bandwidth_source,
        kernel: opts.kernel,
        n_periods,
    })
}

/// Collapse row-level scores `x̃_it ε̃_it` into one moment vector per period.
///
/// Returns a `T×K` matrix whose row `t` is `h_t = Σ_i x̃_it ε̃_it`. Periods
/// without rows get a zero moment.
///
/// Errors
/// ------
/// - `InferenceError::NoPeriods` if `n_periods == 0`.
/// - `InferenceError::DimensionMismatch` if `residuals` or `period_of` do
///   not have one entry per row of `x`.
/// - `InferenceError::PeriodOutOfRange` for an index `≥ n_periods`.
pub fn period_moments(
    x: &Array2<f64>, residuals: &Array1<f64>, period_of: &[usize], n_periods: usize,
) -> InferenceResult<Array2<f64>> {
    let n = x.nrows();
    if n_periods == 0 {
        return Err(InferenceError::NoPeriods);
    }
    if residuals.len() != n {
        return Err(InferenceError::DimensionMismatch {
            what: "residuals",
            expected: n,
            found: residuals.len(),
        });
    }
    if period_of.len() != n {
        return Err(InferenceError::DimensionMismatch {
            what: "period index",
            expected: n,
            found: period_of.len(),
        });
    }

    let mut moments = Array2::<f64>::zeros((n_periods, x.ncols()));
    for (row, (&t, &e)) in period_of.iter().zip(residuals.iter()).enumerate() {
        if t >= n_periods {
            return Err(InferenceError::PeriodOutOfRange { index: t, n_periods });
        }
        moments.row_mut(t).scaled_add(e, &x.row(row));
    }
    Ok(moments)
}

/// Kernel-weighted long-run variance of a `T×K` moment series.
///
/// Computes `S = Γ₀ + Σ_{k=1}^{L} w_k (Γ_k + Γ_kᵀ)` with unscaled sums
/// `Γ_k = Σ_t h_t h_{t−k}ᵀ`. The caller must ensure `bandwidth ≤ T − 1`.
pub fn long_run_variance(moments: &Array2<f64>, bandwidth: usize, kernel: &KernelType) -> Array2<f64> {
    let k = moments.ncols();
    let mut meat = Array2::<f64>::zeros((k, k));
    for lag in 0..=bandwidth {
        add_autocovariance(&mut meat, moments, lag, bandwidth, kernel);
    }
    meat
}

// ---- Helper methods ----

/// Add the lag-`lag` term to the long-run variance accumulator.
///
/// For `lag = 0` adds `HᵀH`; for `lag > 0` adds `w (Γ_k + Γ_kᵀ)` where
/// `Γ_k = H_{k:}ᵀ H_{:T−k}`.
///
/// # Panics
/// Panics if `moments` has fewer than `lag + 1` rows.
fn add_autocovariance(
    meat: &mut Array2<f64>, moments: &Array2<f64>, lag: usize, bandwidth: usize,
    kernel: &KernelType,
) {
    let t = moments.nrows();
    match lag {
        0 => {
            meat.scaled_add(1.0, &moments.t().dot(moments));
        }
        _ => {
            let weight = kernel.lag_weight(lag, bandwidth);
            let lagged = moments.slice(s![lag.., ..]);
            let leading = moments.slice(s![..t - lag, ..]);
            let gamma_k = lagged.t().dot(&leading);
            meat.scaled_add(weight, &gamma_k);
            meat.scaled_add(weight, &gamma_k.t());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Per-period moment aggregation.
    // - `long_run_variance` against a manual Bartlett computation.
    // - Collapse to the contemporaneous term for T = 1 and for L = 0.
    // - Bandwidth resolution (override, rule, truncation).
    // - The sandwich for a one-regressor design with a known answer.
    //
    // They intentionally DO NOT cover:
    // - The within transform that produces `x̃` and `ε̃`; see
    //   `estimation::within` and `estimation::two_way`.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-10;

    fn assert_matrices_close(a: &Array2<f64>, b: &Array2<f64>, tol: f64) {
        assert_eq!(a.shape(), b.shape(), "shape mismatch: {:?} vs {:?}", a.shape(), b.shape());
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert_relative_eq!(a[[i, j]], b[[i, j]], epsilon = tol, max_relative = tol);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Rows in the same period are summed into a single moment vector.
    //
    // Given
    // -----
    // - Four rows over two periods, one regressor, unit residuals.
    //
    // Expect
    // ------
    // - h_0 = x_0 + x_2, h_1 = x_1 + x_3.
    fn period_moments_sums_scores_within_each_period() {
        // Arrange
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let e = array![1.0, 1.0, 1.0, -1.0];
        let period_of = [0, 1, 0, 1];

        // Act
        let h = period_moments(&x, &e, &period_of, 2).unwrap();

        // Assert
        assert_matrices_close(&h, &array![[4.0], [-2.0]], TOL);
    }

    #[test]
    fn period_moments_rejects_bad_inputs() {
        let x = array![[1.0], [2.0]];
        let e = array![1.0, 1.0];
        assert_eq!(period_moments(&x, &e, &[0, 0], 0), Err(InferenceError::NoPeriods));
        assert!(matches!(
            period_moments(&x, &array![1.0], &[0, 0], 1),
            Err(InferenceError::DimensionMismatch { .. })
        ));
        assert_eq!(
            period_moments(&x, &e, &[0, 3], 2),
            Err(InferenceError::PeriodOutOfRange { index: 3, n_periods: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Validate `long_run_variance` against a direct Bartlett sum on a
    // univariate moment series.
    fn long_run_variance_matches_manual_bartlett_sum() {
        // Arrange
        let h = array![[1.0], [0.5], [-0.25], [2.0]];
        let bandwidth = 2;

        // Act
        let s_lib = long_run_variance(&h, bandwidth, &KernelType::Bartlett);

        // Manual: Γ₀ + Σ_k (1 − k/3)·2·Γ_k
        let v = [1.0, 0.5, -0.25, 2.0];
        let gamma = |k: usize| (k..4).map(|t| v[t] * v[t - k]).sum::<f64>();
        let expected = gamma(0) + 2.0 * (2.0 / 3.0) * gamma(1) + 2.0 * (1.0 / 3.0) * gamma(2);

        // Assert
        assert_relative_eq!(s_lib[[0, 0]], expected, epsilon = TOL);
    }

    #[test]
    // Purpose
    // -------
    // With a single period the estimator keeps only the contemporaneous
    // cross-sectional term, whatever bandwidth was requested.
    //
    // Given
    // -----
    // - Three rows, all in period 0; requested bandwidth 5.
    //
    // Expect
    // ------
    // - Effective bandwidth 0 and V = G⁻¹ (h hᵀ) G⁻¹.
    fn single_period_collapses_to_contemporaneous_term() {
        // Arrange
        let x = array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]];
        let e = array![0.5, -1.0, 2.0];
        let gram_inv = array![[0.5, 0.0], [0.0, 0.25]];
        let opts =
            DriscollKraayOptions::default().with_bandwidth(5).with_small_sample_correction(false);

        // Act
        let dk = driscoll_kraay(&x, &e, &[0, 0, 0], 1, &gram_inv, 1, &opts).unwrap();

        // Assert
        let h = array![[0.5 * 1.0 + 2.0 * 1.0, -2.0 + 2.0]];
        let expected = gram_inv.dot(&h.t().dot(&h)).dot(&gram_inv);
        assert_eq!(dk.bandwidth, 0);
        assert_eq!(dk.n_periods, 1);
        assert_matrices_close(&dk.covariance, &expected, TOL);
    }

    #[test]
    fn zero_bandwidth_keeps_only_gamma_zero() {
        let h = array![[1.0, 2.0], [3.0, -1.0], [0.5, 0.5]];
        let s0 = long_run_variance(&h, 0, &KernelType::Bartlett);
        assert_matrices_close(&s0, &h.t().dot(&h), TOL);
    }

    #[test]
    // Purpose
    // -------
    // Bandwidth overrides and rules are both truncated to T − 1 and report
    // their provenance; the default is the Newey–West rule with the N/df
    // correction.
    fn resolve_bandwidth_truncates_and_reports_source() {
        let default = DriscollKraayOptions::default();
        assert_eq!(default.rule, BandwidthRule::NeweyWest);
        assert!(default.small_sample_correction);
        assert_eq!(
            default.resolve_bandwidth(24),
            (2, BandwidthSource::Rule(BandwidthRule::NeweyWest))
        );
        // T = 10: ⌊4 · 0.1^{2/9}⌋ = 2 where the fourth-root rule gives 1.
        assert_eq!(
            default.resolve_bandwidth(10),
            (2, BandwidthSource::Rule(BandwidthRule::NeweyWest))
        );
        assert_eq!(
            DriscollKraayOptions { rule: BandwidthRule::FourthRoot, ..default.clone() }
                .resolve_bandwidth(10),
            (1, BandwidthSource::Rule(BandwidthRule::FourthRoot))
        );
        assert_eq!(
            default.clone().with_bandwidth(10).resolve_bandwidth(4),
            (3, BandwidthSource::Override)
        );
        assert_eq!(default.resolve_bandwidth(1).0, 0);
    }

    #[test]
    // Purpose
    // -------
    // For a single regressor the sandwich is S / (x̃ᵀx̃)², and the
    // small-sample correction scales it by N/df.
    fn sandwich_matches_scalar_formula_and_correction_scales_it() {
        // Arrange
        let x = array![[1.0], [-1.0], [2.0], [-2.0]];
        let e = array![0.1, 0.2, -0.3, 0.4];
        let period_of = [0, 0, 1, 1];
        let gram = 10.0;
        let gram_inv = array![[1.0 / gram]];
        let opts =
            DriscollKraayOptions::default().with_bandwidth(1).with_small_sample_correction(false);

        // Act
        let plain = driscoll_kraay(&x, &e, &period_of, 2, &gram_inv, 2, &opts).unwrap();
        let corrected_opts = opts.clone().with_small_sample_correction(true);
        let corrected =
            driscoll_kraay(&x, &e, &period_of, 2, &gram_inv, 2, &corrected_opts).unwrap();

        // Assert
        let h0 = 0.1 - 0.2;
        let h1 = -0.6 - 0.8;
        let s = h0 * h0 + h1 * h1 + 2.0 * 0.5 * h1 * h0;
        assert_relative_eq!(plain.covariance[[0, 0]], s / (gram * gram), epsilon = TOL);
        assert_relative_eq!(plain.std_errors[0], (s / (gram * gram)).sqrt(), epsilon = TOL);
        assert_relative_eq!(
            corrected.covariance[[0, 0]],
            2.0 * plain.covariance[[0, 0]],
            epsilon = TOL
        );
    }
}
