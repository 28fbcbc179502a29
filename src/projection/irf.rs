//! projection::irf — horizon loop and impulse-response containers.
//!
//! Purpose
//! -------
//! Estimate one two-way fixed-effects regression per horizon `h = 0..=H`,
//! attach Driscoll–Kraay inference, and collect the results into an
//! [`Irf`]. Horizons share the input panel (and its memo of derived series)
//! but no parameters.
//!
//! Key behaviors
//! -------------
//! - Configuration and variable names are validated before the first
//!   horizon; an unknown variable aborts the run.
//! - A horizon whose design is not identified is recorded as
//!   [`HorizonOutcome::Failed`] and the loop continues.
//! - [`Irf::path`] extracts the coefficient path of one regressor with
//!   `± band_multiplier · se` bands as a [`BandPath`].
//!
//! Conventions
//! -----------
//! - One `debug` event is emitted per estimated horizon and one `warn`
//!   event per failed horizon.
use crate::{
    estimation::{build_design, errors::EstimationError, fit_two_way},
    inference::driscoll_kraay::driscoll_kraay,
    panel::{data::Panel, errors::PanelError, shift::SeriesResolver},
    projection::{
        config::LpConfig,
        errors::{ProjectionError, ProjectionResult},
        horizon::{CoefficientEstimate, HorizonFailure, HorizonOutcome, HorizonResult, KeyedResidual},
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// LocalProjection — estimator for one [`LpConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct LocalProjection {
    config: LpConfig,
}

impl LocalProjection {
    pub fn new(config: LpConfig) -> Self {
        LocalProjection { config }
    }

    pub fn config(&self) -> &LpConfig {
        &self.config
    }

    /// Estimate horizons `0..=H` on `panel`.
    ///
    /// Errors
    /// ------
    /// - `ProjectionError::Config` for an invalid configuration.
    /// - `ProjectionError::Panel` if a configured variable is not in the
    ///   panel.
    /// - `ProjectionError::Inference` if covariance inputs are not
    ///   conformable (not expected for designs built here).
    pub fn estimate(&self, panel: &Panel) -> ProjectionResult<Irf> {
        let mut resolver = SeriesResolver::new(panel);
        self.estimate_with(&mut resolver)
    }

    /// Like [`LocalProjection::estimate`], reusing an existing memo of
    /// derived series.
    pub fn estimate_with(&self, resolver: &mut SeriesResolver<'_>) -> ProjectionResult<Irf> {
        let cfg = &self.config;
        cfg.validate()?;
        let panel = resolver.panel();
        if let Some(name) = cfg.variables().into_iter().find(|v| !panel.has_variable(v)) {
            return Err(PanelError::UnknownVariable { name: name.to_string() }.into());
        }

        let horizons = (0..=cfg.horizons)
            .map(|h| self.estimate_horizon(resolver, h))
            .collect::<ProjectionResult<Vec<_>>>()?;
        Ok(Irf { config: cfg.clone(), horizons })
    }

    fn estimate_horizon(
        &self, resolver: &mut SeriesResolver<'_>, h: usize,
    ) -> ProjectionResult<HorizonOutcome> {
        let cfg = &self.config;
        let spec = cfg.design_spec(h);
        let design = build_design(resolver, &spec)?;
        let fit = match fit_two_way(&design) {
            Ok(fit) => fit,
            Err(EstimationError::InsufficientData { horizon, configuration, reason }) => {
                warn!(horizon, outcome = %cfg.outcome, %reason, "horizon not estimated");
                return Ok(HorizonOutcome::Failed(HorizonFailure { horizon, configuration, reason }));
            }
            Err(other) => return Err(other.into()),
        };

        let dk = driscoll_kraay(
            &fit.x_within,
            &fit.within_residuals,
            &design.period,
            design.n_periods(),
            &fit.gram_inv,
            fit.df_resid,
            &cfg.driscoll_kraay,
        )?;
        debug!(
            horizon = h,
            outcome = %cfg.outcome,
            n_obs = design.n_obs(),
            bandwidth = dk.bandwidth,
            r2_within = fit.r2_within,
            "horizon estimated"
        );

        let coefficients = design
            .names
            .iter()
            .enumerate()
            .map(|(j, name)| CoefficientEstimate::new(name.clone(), fit.beta[j], dk.std_errors[j]))
            .collect();
        let residuals = design
            .keys
            .iter()
            .enumerate()
            .map(|(r, key)| KeyedResidual {
                key: key.clone(),
                residual: fit.residuals[r],
                within_residual: fit.within_residuals[r],
            })
            .collect();

        Ok(HorizonOutcome::Estimated(HorizonResult {
            horizon: h,
            coefficients,
            covariance: dk.covariance,
            residuals,
            n_obs: design.n_obs(),
            n_entities: design.n_entities,
            n_periods: design.n_periods(),
            df_resid: fit.df_resid,
            r2_within: fit.r2_within,
            bandwidth: dk.bandwidth,
            bandwidth_source: dk.bandwidth_source,
        }))
    }
}

/// Irf — ordered horizon outcomes of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Irf {
    pub config: LpConfig,
    pub horizons: Vec<HorizonOutcome>,
}

impl Irf {
    pub fn len(&self) -> usize {
        self.horizons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizons.is_empty()
    }

    /// Result at horizon `h`, if it was estimated.
    pub fn horizon(&self, h: usize) -> Option<&HorizonResult> {
        self.horizons.get(h).and_then(HorizonOutcome::estimated)
    }

    pub fn estimated(&self) -> impl Iterator<Item = &HorizonResult> {
        self.horizons.iter().filter_map(HorizonOutcome::estimated)
    }

    pub fn failures(&self) -> impl Iterator<Item = &HorizonFailure> {
        self.horizons.iter().filter_map(|o| match o {
            HorizonOutcome::Failed(f) => Some(f),
            HorizonOutcome::Estimated(_) => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Coefficients named `name` at every horizon.
    ///
    /// Errors
    /// ------
    /// - `ProjectionError::MissingHorizon` for the first failed horizon.
    /// - `ProjectionError::UnknownCoefficient` if a horizon has no such
    ///   regressor.
    pub fn coefficients(&self, name: &str) -> ProjectionResult<Vec<&CoefficientEstimate>> {
        self.horizons
            .iter()
            .map(|outcome| match outcome {
                HorizonOutcome::Estimated(r) => r
                    .coefficient(name)
                    .ok_or_else(|| ProjectionError::UnknownCoefficient { name: name.to_string() }),
                HorizonOutcome::Failed(f) => Err(ProjectionError::MissingHorizon {
                    horizon: f.horizon,
                    reason: f.reason.clone(),
                }),
            })
            .collect()
    }

    /// Point path and `± band_multiplier · se` bands of one coefficient.
    pub fn path(&self, name: &str) -> ProjectionResult<BandPath> {
        let m = self.config.band_multiplier;
        let coefs = self.coefficients(name)?;
        let mut path = BandPath::with_capacity(coefs.len());
        for (h, c) in coefs.iter().enumerate() {
            let (lo, hi) = c.band(m);
            path.push(h, c.estimate, lo, hi);
        }
        Ok(path)
    }

    /// Path of the shock coefficient.
    pub fn shock_path(&self) -> ProjectionResult<BandPath> {
        self.path(&self.config.shock_name())
    }

    /// Path of `name` over the horizons before the first failed one.
    ///
    /// Returns the leading path and the failure that ended it, if any.
    /// Running sums over the path are undefined past that horizon.
    ///
    /// Errors
    /// ------
    /// - `ProjectionError::UnknownCoefficient` if an estimated horizon has no
    ///   such regressor.
    pub fn leading_path(
        &self, name: &str,
    ) -> ProjectionResult<(BandPath, Option<&HorizonFailure>)> {
        let m = self.config.band_multiplier;
        let mut path = BandPath::with_capacity(self.horizons.len());
        for (h, outcome) in self.horizons.iter().enumerate() {
            match outcome {
                HorizonOutcome::Estimated(r) => {
                    let c = r.coefficient(name).ok_or_else(|| {
                        ProjectionError::UnknownCoefficient { name: name.to_string() }
                    })?;
                    let (lo, hi) = c.band(m);
                    path.push(h, c.estimate, lo, hi);
                }
                HorizonOutcome::Failed(f) => return Ok((path, Some(f))),
            }
        }
        Ok((path, None))
    }

    /// Path of the interaction coefficient.
    pub fn interaction_path(&self) -> ProjectionResult<BandPath> {
        let name = self
            .config
            .interaction_name()
            .ok_or_else(|| ProjectionError::UnknownCoefficient { name: "interaction".into() })?;
        self.path(&name)
    }
}

/// BandPath — point estimates with lower and upper bands over horizons.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BandPath {
    pub horizons: Vec<usize>,
    pub mean: Vec<f64>,
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl BandPath {
    pub fn with_capacity(n: usize) -> Self {
        BandPath {
            horizons: Vec::with_capacity(n),
            mean: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, horizon: usize, mean: f64, low: f64, high: f64) {
        self.horizons.push(horizon);
        self.mean.push(mean);
        self.low.push(low);
        self.high.push(high);
    }

    /// Keep the first `len` horizons.
    pub fn truncate(&mut self, len: usize) {
        self.horizons.truncate(len);
        self.mean.truncate(len);
        self.low.truncate(len);
        self.high.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        panel::{data::Observation, shift::SeriesKey},
        projection::config::{DependentForm, Moderator},
    };
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact recovery of a unit response without noise.
    // - Horizon-local failures and up-front variable validation.
    // - Path extraction with bands.
    //
    // End-to-end scenarios with diagnostics live in `tests/`.
    // -------------------------------------------------------------------------

    /// 3 entities × 6 periods with `y = s` and a moderator `m`.
    fn panel() -> Panel {
        let mut obs = Vec::new();
        for (i, e) in ["A", "B", "C"].iter().enumerate() {
            for t in 0..6_i64 {
                let s = (((i as i64 + 2) * (t + 1) * 7) % 11) as f64 - 5.0;
                obs.push(
                    Observation::new(*e, 2000 + t)
                        .with("y", s)
                        .with("s", s)
                        .with("m", (i as f64) + 0.1 * t as f64),
                );
            }
        }
        Panel::from_observations(obs).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // With `y = s` exactly, the level-form impact response is 1 and its
    // standard error vanishes.
    fn unit_response_is_recovered_at_impact() {
        // Arrange
        let panel = panel();
        let cfg = LpConfig::new("y", "s").with_dependent(DependentForm::Level).with_horizons(0);

        // Act
        let irf = LocalProjection::new(cfg).estimate(&panel).unwrap();

        // Assert
        let h0 = irf.horizon(0).unwrap();
        assert_relative_eq!(h0.shock().estimate, 1.0, epsilon = 1e-10);
        assert!(h0.shock().std_error.is_finite() && h0.shock().std_error < 1e-8);
        assert_eq!(h0.n_obs, 18);
        assert_eq!(h0.residuals.len(), 18);
    }

    #[test]
    fn unknown_variable_aborts_before_estimation() {
        let panel = panel();
        let cfg = LpConfig::new("y", "s").with_controls(["nope"]);
        let err = LocalProjection::new(cfg).estimate(&panel).unwrap_err();
        assert_eq!(err, ProjectionError::Panel(PanelError::UnknownVariable { name: "nope".into() }));
    }

    #[test]
    // Purpose
    // -------
    // Late horizons that run out of rows fail individually while earlier
    // horizons are still estimated.
    fn unidentified_horizons_are_recorded_not_raised() {
        // Arrange
        let panel = panel();
        let cfg = LpConfig::new("y", "s").with_horizons(5);

        // Act
        let irf = LocalProjection::new(cfg).estimate(&panel).unwrap();

        // Assert
        assert_eq!(irf.len(), 6);
        assert!(irf.horizon(0).is_some());
        assert!(!irf.is_complete());
        let failed: Vec<usize> = irf.failures().map(|f| f.horizon).collect();
        assert!(failed.contains(&5));
        assert!(matches!(irf.shock_path(), Err(ProjectionError::MissingHorizon { .. })));
    }

    #[test]
    // Purpose
    // -------
    // The leading path stops at the first failed horizon and reports it.
    //
    // Given
    // -----
    // - Level form on 3 × 6 periods: horizon 5 has a single period left and
    //   no residual degrees of freedom, horizons 0..=4 are identified.
    fn leading_path_stops_at_first_failed_horizon() {
        // Arrange
        let panel = panel();
        let cfg = LpConfig::new("y", "s").with_dependent(DependentForm::Level).with_horizons(5);

        // Act
        let irf = LocalProjection::new(cfg).estimate(&panel).unwrap();
        let (path, cut) = irf.leading_path(&irf.config.shock_name()).unwrap();

        // Assert
        assert_eq!(path.horizons, vec![0, 1, 2, 3, 4]);
        assert_eq!(cut.map(|f| f.horizon), Some(5));
        assert!(matches!(
            irf.leading_path("nope"),
            Err(ProjectionError::UnknownCoefficient { .. })
        ));

        let mut short = path.clone();
        short.truncate(2);
        assert_eq!(short.horizons, vec![0, 1]);
        assert_eq!(short.high.len(), 2);
    }

    #[test]
    fn path_applies_band_multiplier() {
        let panel = panel();
        let cfg = LpConfig::new("y", "s")
            .with_moderator(Moderator::new("m"))
            .with_band_multiplier(2.0)
            .with_horizons(1);

        let irf = LocalProjection::new(cfg).estimate(&panel).unwrap();
        let path = irf.shock_path().unwrap();
        let inter = irf.interaction_path().unwrap();

        assert_eq!(path.horizons, vec![0, 1]);
        for h in 0..2 {
            let c = irf.horizon(h).unwrap().shock();
            assert_relative_eq!(path.high[h] - path.mean[h], 2.0 * c.std_error, epsilon = 1e-12);
            assert_relative_eq!(path.mean[h] - path.low[h], 2.0 * c.std_error, epsilon = 1e-12);
        }
        assert_eq!(inter.len(), 2);
        assert_eq!(irf.horizon(0).unwrap().coefficients[1].name, "s:L1.m");
        assert_eq!(SeriesKey::level("s").to_string(), irf.config.shock_name());
    }
}
