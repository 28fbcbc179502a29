//! diagnostics::battery — one call for the full specification-test battery.
//!
//! Purpose
//! -------
//! Estimate the baseline projection once and run every diagnostic against
//! it, sharing one memo of derived series. Each sub-test ends up either
//! completed or explicitly skipped; only configuration errors abort.
//!
//! Key behaviors
//! -------------
//! - Tests that need an interaction term are recorded as skipped when the
//!   baseline has no moderator.
//! - The exogeneity regression and multiplier robustness run only when
//!   configured.
use crate::{
    diagnostics::{
        errors::DiagnosticResult,
        exogeneity::{ExogeneityConfig, ExogeneityTest, exogeneity_test},
        outcome::{DiagnosticOutcome, SkipRecord},
        pesaran::{PesaranCd, ResidualKind, pesaran_cd_by_horizon},
        placebo::{PlaceboTest, placebo_test},
        r2::{R2Row, r2_comparison},
        robustness::{
            DEFAULT_QUANTILE_PAIRS, InteractionReport, MultiplierReport, QuantileResponses,
            Variant, conditional_responses, interaction_robustness, multiplier_robustness,
        },
        unit_root::{IpsTest, ips_test},
        wald::{WaldTest, interaction_wald},
    },
    multiplier::pipeline::MultiplierSpec,
    panel::{data::Panel, shift::SeriesResolver},
    projection::{
        config::LpConfig,
        irf::{Irf, LocalProjection},
    },
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// BatteryConfig — what the battery runs.
///
/// Fields
/// ------
/// - `base`: baseline projection; a moderator enables the interaction tests.
/// - `unit_root_variables`: variables for the IPS-style test.
/// - `exogeneity`: optional shock-predictability regression.
/// - `residual_kind`: residuals correlated by the CD test.
/// - `variants`: robustness variants of the interaction path.
/// - `quantile_pairs`: moderator quantiles for conditional responses.
/// - `multiplier`: optional multiplier run swept over `variants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    pub base: LpConfig,
    pub unit_root_variables: Vec<String>,
    pub exogeneity: Option<ExogeneityConfig>,
    pub residual_kind: ResidualKind,
    pub variants: Vec<Variant>,
    pub quantile_pairs: Vec<(f64, f64)>,
    pub multiplier: Option<MultiplierSpec>,
}

impl BatteryConfig {
    /// Baseline only; unit-root checks on the outcome and shock, lag orders
    /// 1 to 3 as robustness variants, default quantile pairs.
    pub fn new(base: LpConfig) -> Self {
        BatteryConfig {
            unit_root_variables: vec![base.outcome.clone(), base.shock.base.clone()],
            exogeneity: None,
            residual_kind: ResidualKind::default(),
            variants: Variant::lag_orders([1, 2, 3]),
            quantile_pairs: DEFAULT_QUANTILE_PAIRS.to_vec(),
            multiplier: None,
            base,
        }
    }

    pub fn with_unit_root_variables<S: Into<String>>(
        mut self, variables: impl IntoIterator<Item = S>,
    ) -> Self {
        self.unit_root_variables = variables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exogeneity(mut self, cfg: ExogeneityConfig) -> Self {
        self.exogeneity = Some(cfg);
        self
    }

    pub fn with_residual_kind(mut self, kind: ResidualKind) -> Self {
        self.residual_kind = kind;
        self
    }

    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_multiplier(mut self, spec: MultiplierSpec) -> Self {
        self.multiplier = Some(spec);
        self
    }

    /// Run the battery on `panel`.
    ///
    /// Errors
    /// ------
    /// - Configuration and unknown-variable errors of any sub-test.
    pub fn run(&self, panel: &Panel) -> DiagnosticResult<BatteryReport> {
        let mut resolver = SeriesResolver::new(panel);
        let r = &mut resolver;
        let irf = LocalProjection::new(self.base.clone()).estimate_with(r)?;
        let moderated = self.base.moderator.is_some();

        let wald = if moderated {
            DiagnosticOutcome::settle("interaction wald", interaction_wald(&irf))?
        } else {
            no_moderator("interaction wald")
        };
        let pesaran = pesaran_cd_by_horizon(&irf, self.residual_kind)?;
        let unit_root = self
            .unit_root_variables
            .iter()
            .map(|v| DiagnosticOutcome::settle(format!("unit root {v}"), ips_test(panel, v)))
            .collect::<DiagnosticResult<Vec<_>>>()?;
        let placebo = DiagnosticOutcome::settle("placebo", placebo_test(r, &self.base))?;
        let exogeneity = self
            .exogeneity
            .as_ref()
            .map(|cfg| DiagnosticOutcome::settle("exogeneity", exogeneity_test(r, cfg)))
            .transpose()?;
        let (r2, robustness, conditional) = if moderated {
            (
                DiagnosticOutcome::Completed(r2_comparison(r, &self.base)?),
                DiagnosticOutcome::Completed(interaction_robustness(r, &self.base, &self.variants)?),
                DiagnosticOutcome::settle(
                    "conditional responses",
                    conditional_responses(r, &irf, &self.quantile_pairs),
                )?,
            )
        } else {
            (no_moderator("r2 comparison"), no_moderator("robustness"), no_moderator("conditional responses"))
        };
        let multiplier = self
            .multiplier
            .as_ref()
            .map(|spec| multiplier_robustness(r, spec, &self.variants))
            .transpose()?;

        let report = BatteryReport {
            irf,
            interaction_wald: wald,
            pesaran,
            unit_root,
            placebo,
            exogeneity,
            r2,
            robustness,
            conditional,
            multiplier,
        };
        debug!(skipped = report.skipped().len(), "diagnostic battery finished");
        Ok(report)
    }
}

/// Everything the battery produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryReport {
    pub irf: Irf,
    pub interaction_wald: DiagnosticOutcome<WaldTest>,
    pub pesaran: Vec<DiagnosticOutcome<PesaranCd>>,
    pub unit_root: Vec<DiagnosticOutcome<IpsTest>>,
    pub placebo: DiagnosticOutcome<PlaceboTest>,
    pub exogeneity: Option<DiagnosticOutcome<ExogeneityTest>>,
    pub r2: DiagnosticOutcome<Vec<DiagnosticOutcome<R2Row>>>,
    pub robustness: DiagnosticOutcome<Vec<DiagnosticOutcome<InteractionReport>>>,
    pub conditional: DiagnosticOutcome<Vec<QuantileResponses>>,
    pub multiplier: Option<Vec<DiagnosticOutcome<MultiplierReport>>>,
}

impl BatteryReport {
    /// Top-level and nested skip records, in battery order.
    pub fn skipped(&self) -> Vec<&SkipRecord> {
        let mut out = Vec::new();
        push_skip(&mut out, &self.interaction_wald);
        self.pesaran.iter().for_each(|o| push_skip(&mut out, o));
        self.unit_root.iter().for_each(|o| push_skip(&mut out, o));
        push_skip(&mut out, &self.placebo);
        if let Some(o) = &self.exogeneity {
            push_skip(&mut out, o);
        }
        push_skip(&mut out, &self.r2);
        if let Some(rows) = self.r2.completed() {
            rows.iter().for_each(|o| push_skip(&mut out, o));
        }
        push_skip(&mut out, &self.robustness);
        if let Some(reports) = self.robustness.completed() {
            reports.iter().for_each(|o| push_skip(&mut out, o));
        }
        push_skip(&mut out, &self.conditional);
        if let Some(reports) = &self.multiplier {
            reports.iter().for_each(|o| push_skip(&mut out, o));
        }
        out
    }
}

// ---- Helper methods ----

fn no_moderator<T>(subject: &str) -> DiagnosticOutcome<T> {
    DiagnosticOutcome::Skipped(SkipRecord::new(subject, "no moderator configured"))
}

fn push_skip<'a, T>(out: &mut Vec<&'a SkipRecord>, outcome: &'a DiagnosticOutcome<T>) {
    if let DiagnosticOutcome::Skipped(s) = outcome {
        out.push(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_outcome_and_shock() {
        let cfg = BatteryConfig::new(LpConfig::new("gdp", "fe"));
        assert_eq!(cfg.unit_root_variables, vec!["gdp", "fe"]);
        assert_eq!(cfg.variants, Variant::lag_orders([1, 2, 3]));
        assert_eq!(cfg.quantile_pairs.len(), 3);
        assert!(cfg.exogeneity.is_none() && cfg.multiplier.is_none());
    }

    #[test]
    fn no_moderator_records_a_skip() {
        let skipped: DiagnosticOutcome<WaldTest> = no_moderator("interaction wald");
        assert_eq!(
            skipped,
            DiagnosticOutcome::Skipped(SkipRecord::new("interaction wald", "no moderator configured"))
        );
    }
}
