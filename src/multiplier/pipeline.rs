//! multiplier::pipeline — outcome and ratio projections to a multiplier.
//!
//! Purpose
//! -------
//! Run the two local projections a ratio multiplier needs (an outcome such
//! as log real GDP and a ratio such as the public-investment share) under
//! one shared configuration, cumulate them, and apply
//! [`multiplier`](crate::multiplier::multiplier).
//!
//! Key behaviors
//! -------------
//! - The outcome path is scaled by `outcome_scale` (default 100, log points
//!   to percent) before cumulating; the ratio path by `ratio_scale`
//!   (default 1).
//! - The share weight defaults to [`mean_share`] of the ratio variable on
//!   the estimation panel, so subsample runs re-derive it.
//! - A failed horizon in either projection ends the table there: the
//!   cumulative sums are undefined past it. The cut-off is recorded in
//!   [`MultiplierEstimate::truncated_at`]; only a failure at horizon 0 is an
//!   error.
use crate::{
    multiplier::{
        cumulative::cumulative,
        errors::{MultiplierError, MultiplierResult},
        ratio::{MultiplierTable, multiplier},
    },
    panel::{data::Panel, shift::SeriesResolver},
    projection::{
        config::LpConfig,
        errors::ProjectionError,
        horizon::HorizonFailure,
        irf::{BandPath, Irf, LocalProjection},
    },
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mean of all defined values of `variable`, rescaled to `[0, 1]`.
///
/// Values are read as percentages when the mean exceeds 1, in which case it
/// is divided by 100.
///
/// Errors
/// ------
/// - `MultiplierError::Panel` if `variable` is unknown.
/// - `MultiplierError::EmptyShare` if it has no defined value.
pub fn mean_share(panel: &Panel, variable: &str) -> MultiplierResult<f64> {
    let mean = panel
        .mean(variable)?
        .ok_or_else(|| MultiplierError::EmptyShare { variable: variable.to_string() })?;
    Ok(if mean > 1.0 { mean / 100.0 } else { mean })
}

/// MultiplierSpec — configuration of a ratio-multiplier run.
///
/// Fields
/// ------
/// - `base`: projection configuration of the outcome; the ratio projection
///   reuses it with `outcome` replaced by `ratio`.
/// - `ratio`: name of the ratio variable.
/// - `share_variable`: variable whose mean share is the weight `w`.
/// - `weight`: explicit weight override, bypassing `share_variable`.
/// - `outcome_scale`, `ratio_scale`: path scales applied before cumulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierSpec {
    pub base: LpConfig,
    pub ratio: String,
    pub share_variable: String,
    pub weight: Option<f64>,
    pub outcome_scale: f64,
    pub ratio_scale: f64,
}

impl MultiplierSpec {
    pub fn new(base: LpConfig, ratio: impl Into<String>) -> Self {
        let ratio = ratio.into();
        MultiplierSpec {
            base,
            share_variable: ratio.clone(),
            ratio,
            weight: None,
            outcome_scale: 100.0,
            ratio_scale: 1.0,
        }
    }

    pub fn with_base(mut self, base: LpConfig) -> Self {
        self.base = base;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Estimate both projections on `panel` and build the table.
    ///
    /// Errors
    /// ------
    /// - `MultiplierError::Projection(MissingHorizon)` if horizon 0 of either
    ///   projection is not identified.
    /// - Panel, share and configuration errors of the underlying runs.
    pub fn estimate(&self, panel: &Panel) -> MultiplierResult<MultiplierEstimate> {
        let mut resolver = SeriesResolver::new(panel);
        self.estimate_with(&mut resolver)
    }

    pub fn estimate_with(
        &self, resolver: &mut SeriesResolver<'_>,
    ) -> MultiplierResult<MultiplierEstimate> {
        let weight = match self.weight {
            Some(w) => w,
            None => mean_share(resolver.panel(), &self.share_variable)?,
        };
        let ratio_cfg = self.base.clone().with_outcome(self.ratio.clone());
        let outcome = LocalProjection::new(self.base.clone()).estimate_with(resolver)?;
        let ratio = LocalProjection::new(ratio_cfg).estimate_with(resolver)?;

        let (mut outcome_path, outcome_cut) = outcome.leading_path(&outcome.config.shock_name())?;
        let (mut ratio_path, ratio_cut) = ratio.leading_path(&ratio.config.shock_name())?;
        let truncated_at =
            outcome_cut.into_iter().chain(ratio_cut).min_by_key(|f| f.horizon).cloned();
        if let Some(cut) = &truncated_at {
            if cut.horizon == 0 {
                return Err(ProjectionError::MissingHorizon {
                    horizon: 0,
                    reason: cut.reason.clone(),
                }
                .into());
            }
            warn!(
                horizon = cut.horizon,
                configuration = %cut.configuration,
                reason = %cut.reason,
                "multiplier table ends before failed horizon"
            );
            outcome_path.truncate(cut.horizon);
            ratio_path.truncate(cut.horizon);
        }

        let outcome_cum = cumulative(&outcome_path, self.outcome_scale);
        let ratio_cum = cumulative(&ratio_path, self.ratio_scale);
        let table = multiplier(&outcome_cum, &ratio_cum, weight)?;
        Ok(MultiplierEstimate { outcome, ratio, outcome_cum, ratio_cum, table, truncated_at })
    }
}

/// Everything produced by a multiplier run.
///
/// `truncated_at` is the earliest failed horizon of the two projections;
/// the cumulative paths and the table cover the horizons before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierEstimate {
    pub outcome: Irf,
    pub ratio: Irf,
    pub outcome_cum: BandPath,
    pub ratio_cum: BandPath,
    pub table: MultiplierTable,
    pub truncated_at: Option<HorizonFailure>,
}
