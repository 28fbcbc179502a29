//! projection::config — configuration of a panel local projection.
//!
//! Purpose
//! -------
//! Collect every knob of a local-projection run in one serializable value,
//! so diagnostics and robustness sweeps can describe a re-estimation as "the
//! baseline configuration with one field changed".
//!
//! Key behaviors
//! -------------
//! - [`LpConfig`] names the outcome, the shock (as a typed [`SeriesKey`], so
//!   a placebo can use `F1.shock`), an optional [`Moderator`], control
//!   variables and their lag order, the horizon count, the dependent-variable
//!   form, the band multiplier, and the Driscoll–Kraay options.
//! - [`LpConfig::validate`] rejects malformed values before any data is
//!   touched; unknown variable names are checked against the panel by the
//!   estimator.
//! - [`LpConfig::design_spec`] turns the configuration into the
//!   per-horizon [`DesignSpec`].
//!
//! Conventions
//! -----------
//! - Regressor order is: shock, interaction (if any), then
//!   `L1.c, …, Lp.c` for each control `c` in the given order.
//! - Defaults: cumulative dependent variable, band multiplier 1, two control
//!   lags, three horizons, and [`DriscollKraayOptions::default`].
use crate::{
    estimation::design::{Dependent, DesignSpec, Regressor},
    inference::driscoll_kraay::DriscollKraayOptions,
    panel::shift::SeriesKey,
    projection::errors::ConfigError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Form of the left-hand-side variable at horizon `h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DependentForm {
    /// `lead_h(y) − lag_1(y)`.
    #[default]
    Cumulative,
    /// `lead_h(y)`.
    Level,
}

/// State-dependence variable interacted with the shock.
///
/// The moderator enters as `lag_{lag}(variable)`, optionally centered at the
/// mean of all its defined lagged values across the whole panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderator {
    pub variable: String,
    pub lag: usize,
    pub center: bool,
}

impl Moderator {
    /// One-period lag, centered.
    pub fn new(variable: impl Into<String>) -> Self {
        Moderator { variable: variable.into(), lag: 1, center: true }
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey::lag(self.variable.clone(), self.lag)
    }
}

/// LpConfig — configuration of one local-projection run.
///
/// Fields
/// ------
/// - `outcome`: name of the response variable `y`.
/// - `shock`: key of the shock series (usually a level series).
/// - `moderator`: optional [`Moderator`] for the interaction specification.
/// - `controls`: control variables entering with lags `1..=control_lags`.
/// - `control_lags`: control lag order `p` (0 disables controls).
/// - `horizons`: last horizon `H`; horizons `0..=H` are estimated.
/// - `dependent`: [`DependentForm`].
/// - `band_multiplier`: standard-error multiple used for reported bands.
/// - `driscoll_kraay`: covariance options (kernel, bandwidth override or
///   rule, small-sample flag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpConfig {
    pub outcome: String,
    pub shock: SeriesKey,
    pub moderator: Option<Moderator>,
    pub controls: Vec<String>,
    pub control_lags: usize,
    pub horizons: usize,
    pub dependent: DependentForm,
    pub band_multiplier: f64,
    pub driscoll_kraay: DriscollKraayOptions,
}

impl LpConfig {
    /// Baseline configuration: no moderator, no controls.
    pub fn new(outcome: impl Into<String>, shock: impl Into<String>) -> Self {
        LpConfig {
            outcome: outcome.into(),
            shock: SeriesKey::level(shock),
            moderator: None,
            controls: Vec::new(),
            control_lags: 2,
            horizons: 3,
            dependent: DependentForm::default(),
            band_multiplier: 1.0,
            driscoll_kraay: DriscollKraayOptions::default(),
        }
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = outcome.into();
        self
    }

    pub fn with_shock(mut self, shock: SeriesKey) -> Self {
        self.shock = shock;
        self
    }

    pub fn with_moderator(mut self, moderator: Moderator) -> Self {
        self.moderator = Some(moderator);
        self
    }

    pub fn without_moderator(mut self) -> Self {
        self.moderator = None;
        self
    }

    pub fn with_controls<S: Into<String>>(mut self, controls: impl IntoIterator<Item = S>) -> Self {
        self.controls = controls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_control_lags(mut self, p: usize) -> Self {
        self.control_lags = p;
        self
    }

    pub fn with_horizons(mut self, horizons: usize) -> Self {
        self.horizons = horizons;
        self
    }

    pub fn with_dependent(mut self, dependent: DependentForm) -> Self {
        self.dependent = dependent;
        self
    }

    pub fn with_band_multiplier(mut self, band_multiplier: f64) -> Self {
        self.band_multiplier = band_multiplier;
        self
    }

    pub fn with_driscoll_kraay(mut self, opts: DriscollKraayOptions) -> Self {
        self.driscoll_kraay = opts;
        self
    }

    /// Fix the Driscoll–Kraay bandwidth instead of using the rule.
    pub fn with_bandwidth(mut self, bandwidth: usize) -> Self {
        self.driscoll_kraay.bandwidth = Some(bandwidth);
        self
    }

    /// Check field-level consistency.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::EmptyName` for an empty outcome, shock, moderator, or
    ///   control name.
    /// - `ConfigError::InvalidBandMultiplier` for a negative or non-finite
    ///   multiplier.
    /// - `ConfigError::ModeratorLag` for a moderator lag of 0.
    /// - `ConfigError::DuplicateControl` for a repeated control.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outcome.trim().is_empty() {
            return Err(ConfigError::EmptyName { field: "outcome" });
        }
        if self.shock.base.trim().is_empty() {
            return Err(ConfigError::EmptyName { field: "shock" });
        }
        if !self.band_multiplier.is_finite() || self.band_multiplier < 0.0 {
            return Err(ConfigError::InvalidBandMultiplier { value: self.band_multiplier });
        }
        if let Some(moderator) = &self.moderator {
            if moderator.variable.trim().is_empty() {
                return Err(ConfigError::EmptyName { field: "moderator" });
            }
            if moderator.lag == 0 {
                return Err(ConfigError::ModeratorLag { lag: moderator.lag });
            }
        }
        let mut seen = BTreeSet::new();
        for control in &self.controls {
            if control.trim().is_empty() {
                return Err(ConfigError::EmptyName { field: "controls" });
            }
            if !seen.insert(control.as_str()) {
                return Err(ConfigError::DuplicateControl { name: control.clone() });
            }
        }
        Ok(())
    }

    /// Base variables the configuration reads from the panel.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = vec![self.outcome.as_str(), self.shock.base.as_str()];
        if let Some(moderator) = &self.moderator {
            names.push(moderator.variable.as_str());
        }
        names.extend(self.controls.iter().map(String::as_str));
        names
    }

    /// Name of the shock coefficient.
    pub fn shock_name(&self) -> String {
        self.shock.to_string()
    }

    /// Name of the interaction coefficient, if a moderator is configured.
    pub fn interaction_name(&self) -> Option<String> {
        self.moderator.as_ref().map(|m| format!("{}:{}", self.shock, m.key()))
    }

    /// Design of the regression at horizon `h`.
    pub fn design_spec(&self, h: usize) -> DesignSpec {
        let lead = SeriesKey::lead(self.outcome.clone(), h);
        let dependent = match self.dependent {
            DependentForm::Cumulative => {
                Dependent::Change { end: lead, start: SeriesKey::lag(self.outcome.clone(), 1) }
            }
            DependentForm::Level => Dependent::Series(lead),
        };

        let mut regressors = vec![Regressor::Series(self.shock.clone())];
        if let Some(moderator) = &self.moderator {
            regressors.push(Regressor::Interaction {
                shock: self.shock.clone(),
                moderator: moderator.key(),
                center: moderator.center,
            });
        }
        for control in &self.controls {
            for lag in 1..=self.control_lags {
                regressors.push(Regressor::Series(SeriesKey::lag(control.clone(), lag)));
            }
        }
        let spec = DesignSpec::new(dependent, regressors, h);
        let label = format!("h={h}: {}", spec.label);
        spec.with_label(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Defaults and builder methods.
    // - Field validation.
    // - Translation into per-horizon designs.
    // -------------------------------------------------------------------------

    #[test]
    fn defaults_are_explicit() {
        let cfg = LpConfig::new("gdp", "fe");
        assert_eq!(cfg.dependent, DependentForm::Cumulative);
        assert_eq!(cfg.band_multiplier, 1.0);
        assert_eq!(cfg.control_lags, 2);
        assert_eq!(cfg.horizons, 3);
        assert_eq!(cfg.driscoll_kraay, DriscollKraayOptions::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed_fields() {
        assert_eq!(
            LpConfig::new("", "fe").validate(),
            Err(ConfigError::EmptyName { field: "outcome" })
        );
        assert!(matches!(
            LpConfig::new("y", "fe").with_band_multiplier(f64::NAN).validate(),
            Err(ConfigError::InvalidBandMultiplier { .. })
        ));
        let zero_lag = Moderator { variable: "ge".into(), lag: 0, center: true };
        assert_eq!(
            LpConfig::new("y", "fe").with_moderator(zero_lag).validate(),
            Err(ConfigError::ModeratorLag { lag: 0 })
        );
        assert_eq!(
            LpConfig::new("y", "fe").with_controls(["a", "b", "a"]).validate(),
            Err(ConfigError::DuplicateControl { name: "a".into() })
        );
    }

    #[test]
    // Purpose
    // -------
    // The per-horizon design follows the documented regressor order and
    // dependent form.
    fn design_spec_orders_shock_interaction_then_control_lags() {
        // Arrange
        let cfg = LpConfig::new("y", "fe")
            .with_moderator(Moderator::new("ge"))
            .with_controls(["g", "d"])
            .with_control_lags(2);

        // Act
        let spec = cfg.design_spec(2);

        // Assert
        let names: Vec<String> = spec.regressors.iter().map(Regressor::name).collect();
        assert_eq!(names, vec!["fe", "fe:L1.ge", "L1.g", "L2.g", "L1.d", "L2.d"]);
        assert_eq!(
            spec.dependent,
            Dependent::Change { end: SeriesKey::lead("y", 2), start: SeriesKey::lag("y", 1) }
        );
        assert_eq!(cfg.interaction_name().as_deref(), Some("fe:L1.ge"));
        assert_eq!(spec.horizon, 2);
        assert!(spec.label.starts_with("h=2: "));
    }

    #[test]
    fn level_form_uses_the_lead_only() {
        let cfg = LpConfig::new("y", "fe").with_dependent(DependentForm::Level);
        assert_eq!(cfg.design_spec(0).dependent, Dependent::Series(SeriesKey::level("y")));
    }

    #[test]
    fn placebo_shock_is_named_by_its_shift() {
        let cfg = LpConfig::new("y", "fe").with_shock(SeriesKey::lead("fe", 1));
        assert_eq!(cfg.shock_name(), "F1.fe");
        assert_eq!(cfg.variables(), vec!["y", "fe"]);
    }
}
