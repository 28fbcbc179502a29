//! diagnostics::placebo — lead-shock placebo projection.
//!
//! Purpose
//! -------
//! Re-estimate a configuration with the shock replaced by its own one-period
//! lead `F1.shock`. A shock that is not anticipated should show neither a
//! significant direct response nor a significant interaction at any horizon.
//!
//! Key behaviors
//! -------------
//! - A horizon passes when every placebo coefficient (shock, and interaction
//!   when a moderator is configured) has `p ≥ level`; the default level is
//!   [`PLACEBO_LEVEL`].
//! - Horizons that cannot be estimated are recorded as skipped; the overall
//!   verdict is taken over the horizons that were estimated.
use crate::{
    diagnostics::{
        errors::{DiagnosticError, DiagnosticResult},
        outcome::{DiagnosticOutcome, SkipRecord},
    },
    panel::shift::{SeriesKey, SeriesResolver},
    projection::{
        config::LpConfig,
        horizon::{CoefficientEstimate, HorizonOutcome},
        irf::LocalProjection,
    },
};
use serde::{Deserialize, Serialize};

/// Significance level of the placebo verdict.
pub const PLACEBO_LEVEL: f64 = 0.10;

/// Placebo coefficients at one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceboHorizon {
    pub horizon: usize,
    pub shock: CoefficientEstimate,
    pub interaction: Option<CoefficientEstimate>,
    pub passes: bool,
}

/// PlaceboTest — per-horizon placebo verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceboTest {
    pub shock: SeriesKey,
    pub level: f64,
    pub horizons: Vec<DiagnosticOutcome<PlaceboHorizon>>,
    pub passes: bool,
}

impl PlaceboTest {
    pub fn n_estimated(&self) -> usize {
        self.horizons.iter().filter(|h| !h.is_skipped()).count()
    }
}

/// Run the placebo projection for `base` at [`PLACEBO_LEVEL`].
pub fn placebo_test(
    resolver: &mut SeriesResolver<'_>, base: &LpConfig,
) -> DiagnosticResult<PlaceboTest> {
    placebo_test_at(resolver, base, PLACEBO_LEVEL)
}

/// Run the placebo projection for `base` at significance `level`.
///
/// Errors
/// ------
/// - Configuration and unknown-variable errors of the projection.
/// - `DiagnosticError::DegenerateInput` if no horizon could be estimated.
pub fn placebo_test_at(
    resolver: &mut SeriesResolver<'_>, base: &LpConfig, level: f64,
) -> DiagnosticResult<PlaceboTest> {
    let shock = SeriesKey::lead(base.shock.base.clone(), 1);
    let cfg = base.clone().with_shock(shock.clone());
    let irf = LocalProjection::new(cfg).estimate_with(resolver)?;
    let shock_name = irf.config.shock_name();
    let interaction_name = irf.config.interaction_name();

    let mut horizons = Vec::with_capacity(irf.len());
    for outcome in &irf.horizons {
        let entry = match outcome {
            HorizonOutcome::Estimated(r) => {
                let find = |name: &str| {
                    r.coefficient(name).cloned().ok_or_else(|| {
                        DiagnosticError::degenerate("placebo", format!("no coefficient `{name}`"))
                    })
                };
                let shock = find(shock_name.as_str())?;
                let interaction = interaction_name.as_deref().map(find).transpose()?;
                let passes = shock.p_value >= level
                    && interaction.as_ref().is_none_or(|c| c.p_value >= level);
                DiagnosticOutcome::Completed(PlaceboHorizon {
                    horizon: r.horizon,
                    shock,
                    interaction,
                    passes,
                })
            }
            HorizonOutcome::Failed(f) => DiagnosticOutcome::Skipped(SkipRecord::new(
                format!("placebo h={}", f.horizon),
                f.reason.clone(),
            )),
        };
        horizons.push(entry);
    }

    let estimated: Vec<&PlaceboHorizon> = horizons.iter().filter_map(|h| h.completed()).collect();
    if estimated.is_empty() {
        return Err(DiagnosticError::degenerate("placebo", "no horizon could be estimated"));
    }
    let passes = estimated.iter().all(|h| h.passes);
    Ok(PlaceboTest { shock, level, horizons, passes })
}
