//! diagnostics::r2 — within-R² of the baseline versus the interaction model.
//!
//! The baseline drops the moderator from the configuration and keeps
//! everything else. Rows are per horizon; a horizon that either model fails
//! to estimate is recorded as skipped.
//!
//! The two models can use different samples: the lagged moderator removes
//! rows where it is missing. Both observation counts are reported.
use crate::{
    diagnostics::{
        errors::{DiagnosticError, DiagnosticResult},
        outcome::{DiagnosticOutcome, SkipRecord},
    },
    panel::shift::SeriesResolver,
    projection::{config::LpConfig, horizon::HorizonOutcome, irf::LocalProjection},
};
use serde::{Deserialize, Serialize};

/// R² comparison at one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct R2Row {
    pub horizon: usize,
    pub baseline: f64,
    pub interaction: f64,
    pub delta: f64,
    pub n_obs_baseline: usize,
    pub n_obs_interaction: usize,
}

/// Compare within-R² across horizons.
///
/// Errors
/// ------
/// - `DiagnosticError::MissingModerator` if `cfg` has no moderator.
/// - Configuration and unknown-variable errors of either projection.
pub fn r2_comparison(
    resolver: &mut SeriesResolver<'_>, cfg: &LpConfig,
) -> DiagnosticResult<Vec<DiagnosticOutcome<R2Row>>> {
    if cfg.moderator.is_none() {
        return Err(DiagnosticError::MissingModerator { test: "r2_comparison" });
    }
    let baseline = LocalProjection::new(cfg.clone().without_moderator()).estimate_with(resolver)?;
    let interaction = LocalProjection::new(cfg.clone()).estimate_with(resolver)?;

    let rows = baseline
        .horizons
        .iter()
        .zip(&interaction.horizons)
        .map(|(b, i)| match (b, i) {
            (HorizonOutcome::Estimated(b), HorizonOutcome::Estimated(i)) => {
                DiagnosticOutcome::Completed(R2Row {
                    horizon: b.horizon,
                    baseline: b.r2_within,
                    interaction: i.r2_within,
                    delta: i.r2_within - b.r2_within,
                    n_obs_baseline: b.n_obs,
                    n_obs_interaction: i.n_obs,
                })
            }
            (HorizonOutcome::Failed(f), _) | (_, HorizonOutcome::Failed(f)) => {
                DiagnosticOutcome::Skipped(SkipRecord::new(
                    format!("r2 h={}", f.horizon),
                    format!("{}: {}", f.configuration, f.reason),
                ))
            }
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        panel::data::{Observation, Panel},
        projection::config::{DependentForm, Moderator},
    };
    use approx::assert_relative_eq;

    /// `y` responds to `s` with a slope that depends on lagged `m`.
    fn state_dependent_panel() -> Panel {
        let mut obs = Vec::new();
        for (i, e) in ["A", "B", "C", "D"].iter().enumerate() {
            let i = i as i64;
            for t in 0..10_i64 {
                let s = (((i + 3) * (t + 2) * 5) % 11) as f64 - 5.0;
                let m = ((i + t) % 3) as f64;
                let m_lag = ((i + t - 1).rem_euclid(3)) as f64;
                let wiggle = 0.01 * ((i * 7 + t) as f64).sin();
                obs.push(
                    Observation::new(*e, 2000 + t)
                        .with("s", s)
                        .with("m", m)
                        .with("y", s * (1.0 + m_lag) + wiggle),
                );
            }
        }
        Panel::from_observations(obs).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Adding the interaction raises within-R² when the response really is
    // state dependent; `delta` is the difference of the two.
    fn interaction_model_explains_more() {
        // Arrange
        let panel = state_dependent_panel();
        let mut resolver = SeriesResolver::new(&panel);
        let cfg = LpConfig::new("y", "s")
            .with_moderator(Moderator::new("m"))
            .with_dependent(DependentForm::Level)
            .with_horizons(0);

        // Act
        let rows = r2_comparison(&mut resolver, &cfg).unwrap();

        // Assert
        let row = rows[0].completed().unwrap();
        assert!(row.interaction > row.baseline);
        assert!(row.interaction > 0.99);
        assert_relative_eq!(row.delta, row.interaction - row.baseline, epsilon = 1e-15);
        assert_eq!(row.n_obs_baseline, 40);
        assert_eq!(row.n_obs_interaction, 36);
    }

    #[test]
    fn configuration_without_moderator_is_rejected() {
        let panel = state_dependent_panel();
        let mut resolver = SeriesResolver::new(&panel);
        let err = r2_comparison(&mut resolver, &LpConfig::new("y", "s")).unwrap_err();
        assert_eq!(err, DiagnosticError::MissingModerator { test: "r2_comparison" });
    }
}
