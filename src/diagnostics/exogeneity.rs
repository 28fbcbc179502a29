//! diagnostics::exogeneity — Granger-type predictability test of the shock.
//!
//! Purpose
//! -------
//! Regress the shock on lags `1..=p` of macro controls under two-way fixed
//! effects with Driscoll–Kraay errors, and test all lag coefficients jointly.
//! Failing to reject supports treating the shock as exogenous to past
//! macro conditions.
//!
//! Conventions
//! -----------
//! - The joint statistic is [`joint_wald`] over the per-term `z` scores,
//!   i.e. the diagonal of the Driscoll–Kraay covariance, with `χ²(K)`
//!   reference.
use crate::{
    diagnostics::{
        errors::DiagnosticResult,
        wald::{WaldTest, joint_wald},
    },
    estimation::{Dependent, DesignSpec, Regressor, build_design, fit_two_way},
    inference::driscoll_kraay::{DriscollKraayOptions, driscoll_kraay},
    panel::shift::{SeriesKey, SeriesResolver},
    projection::horizon::CoefficientEstimate,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// ExogeneityConfig — shock and the macro controls it should not load on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExogeneityConfig {
    pub shock: String,
    pub macro_controls: Vec<String>,
    pub lags: usize,
    pub driscoll_kraay: DriscollKraayOptions,
}

impl ExogeneityConfig {
    /// Two lags of each control, default covariance options.
    pub fn new<S: Into<String>>(
        shock: impl Into<String>, macro_controls: impl IntoIterator<Item = S>,
    ) -> Self {
        ExogeneityConfig {
            shock: shock.into(),
            macro_controls: macro_controls.into_iter().map(Into::into).collect(),
            lags: 2,
            driscoll_kraay: DriscollKraayOptions::default(),
        }
    }

    pub fn with_lags(mut self, lags: usize) -> Self {
        self.lags = lags;
        self
    }

    fn design_spec(&self) -> DesignSpec {
        let regressors = self
            .macro_controls
            .iter()
            .flat_map(|c| (1..=self.lags).map(move |l| Regressor::Series(SeriesKey::lag(c.clone(), l))))
            .collect();
        let spec = DesignSpec::new(Dependent::Series(SeriesKey::level(self.shock.clone())), regressors, 0);
        let label = format!("exogeneity: {}", spec.label);
        spec.with_label(label)
    }
}

/// Per-term coefficients and the joint test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExogeneityTest {
    pub terms: Vec<CoefficientEstimate>,
    pub wald: WaldTest,
    pub r2_within: f64,
    pub n_obs: usize,
}

impl ExogeneityTest {
    /// Whether past macro controls predict the shock at `level`.
    pub fn rejects_exogeneity(&self, level: f64) -> bool {
        self.wald.rejects(level)
    }
}

/// Run the exogeneity regression.
///
/// Errors
/// ------
/// - `DiagnosticError::Estimation` for unknown variables or (skippable)
///   insufficient data.
/// - `DiagnosticError::DegenerateInput` if no lag term is configured or a
///   standard error is zero.
pub fn exogeneity_test(
    resolver: &mut SeriesResolver<'_>, cfg: &ExogeneityConfig,
) -> DiagnosticResult<ExogeneityTest> {
    let design = build_design(resolver, &cfg.design_spec())?;
    let fit = fit_two_way(&design)?;
    let dk = driscoll_kraay(
        &fit.x_within,
        &fit.within_residuals,
        &design.period,
        design.n_periods(),
        &fit.gram_inv,
        fit.df_resid,
        &cfg.driscoll_kraay,
    )?;
    let terms: Vec<CoefficientEstimate> = design
        .names
        .iter()
        .enumerate()
        .map(|(j, name)| CoefficientEstimate::new(name.clone(), fit.beta[j], dk.std_errors[j]))
        .collect();
    let wald = joint_wald(&terms)?;
    debug!(shock = %cfg.shock, statistic = wald.statistic, p_value = wald.p_value, "exogeneity test");
    Ok(ExogeneityTest { terms, wald, r2_within: fit.r2_within, n_obs: design.n_obs() })
}
