//! diagnostics::pesaran — Pesaran (2004) cross-sectional dependence test.
//!
//! Purpose
//! -------
//! Check whether regression residuals of different entities are correlated
//! within periods, which is what motivates Driscoll–Kraay errors.
//!
//! ```text
//! CD = sqrt(2 / (N(N−1))) · Σ_{i<j} sqrt(T_ij) · ρ_ij  ~  N(0, 1) under H0
//! ```
//!
//! Key behaviors
//! -------------
//! - Correlations are pairwise-complete: `ρ_ij` uses only the periods both
//!   entities observe, and `T_ij` counts them.
//! - Pairs with fewer than [`MIN_COMMON_PERIODS`] common periods, or with a
//!   constant residual series, are skipped and listed; `N` still counts all
//!   entities.
//! - p-values are two-sided standard normal.
//!
//! Conventions
//! -----------
//! - [`ResidualKind::Original`] (default) uses `y − Xβ`, which keeps the
//!   fixed effects; [`ResidualKind::Within`] uses the idiosyncratic
//!   residuals.
use crate::{
    diagnostics::{
        errors::{DiagnosticError, DiagnosticResult},
        outcome::{DiagnosticOutcome, SkipRecord},
    },
    projection::{
        horizon::{HorizonOutcome, KeyedResidual, normal_two_sided_p},
        irf::Irf,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum number of common periods for a pair to enter the statistic.
pub const MIN_COMMON_PERIODS: usize = 3;

/// Which residual convention to correlate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResidualKind {
    #[default]
    Original,
    Within,
}

/// Correlation of one entity pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCorrelation {
    pub entity_i: String,
    pub entity_j: String,
    pub common_periods: usize,
    pub rho: f64,
}

/// Pesaran CD statistic with its pairwise detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PesaranCd {
    pub statistic: f64,
    pub p_value: f64,
    pub n_entities: usize,
    pub min_common_periods: usize,
    pub max_common_periods: usize,
    pub pairs: Vec<PairCorrelation>,
    pub skipped_pairs: Vec<SkipRecord>,
}

impl PesaranCd {
    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }
}

/// Pesaran CD test on one set of keyed residuals.
///
/// Errors
/// ------
/// - `DiagnosticError::DegenerateInput` if fewer than two entities are
///   present or no pair has enough common periods.
pub fn pesaran_cd(residuals: &[KeyedResidual], kind: ResidualKind) -> DiagnosticResult<PesaranCd> {
    let mut by_entity: BTreeMap<&str, BTreeMap<i64, f64>> = BTreeMap::new();
    for r in residuals {
        let value = match kind {
            ResidualKind::Original => r.residual,
            ResidualKind::Within => r.within_residual,
        };
        by_entity.entry(r.key.entity.as_str()).or_default().insert(r.key.time, value);
    }
    let n = by_entity.len();
    if n < 2 {
        return Err(DiagnosticError::degenerate(
            "pesaran_cd",
            format!("{n} entities; at least 2 are required"),
        ));
    }

    let entities: Vec<(&str, &BTreeMap<i64, f64>)> =
        by_entity.iter().map(|(e, s)| (*e, s)).collect();
    let mut pairs = Vec::new();
    let mut skipped_pairs = Vec::new();
    let mut weighted_sum = 0.0;
    for (a, (name_i, series_i)) in entities.iter().enumerate() {
        for (name_j, series_j) in &entities[a + 1..] {
            let (xs, ys): (Vec<f64>, Vec<f64>) = series_i
                .iter()
                .filter_map(|(t, x)| series_j.get(t).map(|y| (*x, *y)))
                .unzip();
            let subject = format!("{name_i}-{name_j}");
            let t_ij = xs.len();
            if t_ij < MIN_COMMON_PERIODS {
                skipped_pairs.push(SkipRecord::new(
                    subject,
                    format!("{t_ij} common periods; at least {MIN_COMMON_PERIODS} are required"),
                ));
                continue;
            }
            let Some(rho) = pearson(&xs, &ys) else {
                skipped_pairs.push(SkipRecord::new(subject, "constant residual series"));
                continue;
            };
            weighted_sum += (t_ij as f64).sqrt() * rho;
            pairs.push(PairCorrelation {
                entity_i: name_i.to_string(),
                entity_j: name_j.to_string(),
                common_periods: t_ij,
                rho,
            });
        }
    }
    if pairs.is_empty() {
        return Err(DiagnosticError::degenerate(
            "pesaran_cd",
            "no entity pair has enough common periods",
        ));
    }

    let statistic = (2.0 / (n as f64 * (n as f64 - 1.0))).sqrt() * weighted_sum;
    Ok(PesaranCd {
        statistic,
        p_value: normal_two_sided_p(statistic),
        n_entities: n,
        min_common_periods: pairs.iter().map(|p| p.common_periods).min().unwrap_or(0),
        max_common_periods: pairs.iter().map(|p| p.common_periods).max().unwrap_or(0),
        pairs,
        skipped_pairs,
    })
}

/// Pesaran CD test for every horizon of an IRF; failed horizons and
/// degenerate inputs are recorded as skipped.
pub fn pesaran_cd_by_horizon(
    irf: &Irf, kind: ResidualKind,
) -> DiagnosticResult<Vec<DiagnosticOutcome<PesaranCd>>> {
    irf.horizons
        .iter()
        .map(|outcome| {
            let subject = format!("pesaran_cd h={}", outcome.horizon());
            match outcome {
                HorizonOutcome::Estimated(r) => {
                    DiagnosticOutcome::settle(subject, pesaran_cd(&r.residuals, kind))
                }
                HorizonOutcome::Failed(f) => {
                    Ok(DiagnosticOutcome::Skipped(SkipRecord::new(subject, f.reason.clone())))
                }
            }
        })
        .collect()
}

// ---- Helper methods ----

/// Sample Pearson correlation; `None` if either series is constant.
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
