//! diagnostics::robustness — re-estimation under alternative configurations.
//!
//! Purpose
//! -------
//! Express every robustness check as "the baseline with one thing changed"
//! and run it through the same projection code path:
//!
//! - alternative moderator variables,
//! - alternative control sets or control-lag orders,
//! - subsamples (one entity excluded, or a period window).
//!
//! Key behaviors
//! -------------
//! - [`interaction_robustness`] reports the interaction path of each
//!   [`Variant`] with per-horizon significance flags at
//!   [`ROBUSTNESS_LEVEL`].
//! - [`multiplier_robustness`] rebuilds the multiplier table per variant;
//!   on subsamples the mean share is re-derived from the subsample unless
//!   the weight is fixed.
//! - [`conditional_responses`] evaluates `β_h + θ_h·c` at quantiles of the
//!   (centered) lagged moderator, using linearly interpolated quantiles over
//!   all panel rows where it is defined.
//! - A variant that cannot be estimated is recorded as skipped.
use crate::{
    diagnostics::{
        errors::{DiagnosticError, DiagnosticResult},
        outcome::DiagnosticOutcome,
    },
    multiplier::{pipeline::MultiplierSpec, ratio::MultiplierTable},
    panel::{
        data::{Panel, defined_mean},
        shift::SeriesResolver,
    },
    projection::{
        config::{LpConfig, Moderator},
        irf::{Irf, LocalProjection},
    },
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Significance level of the robustness flags.
pub const ROBUSTNESS_LEVEL: f64 = 0.10;

/// Quantile pairs `(low, high)` of the moderator distribution.
pub const DEFAULT_QUANTILE_PAIRS: [(f64, f64); 3] = [(0.10, 0.90), (0.25, 0.75), (0.33, 0.67)];

/// One alteration of a baseline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    Baseline,
    Moderator(Moderator),
    Controls(Vec<String>),
    ControlLags(usize),
    ExcludeEntity(String),
    PeriodWindow { start: i64, end: i64 },
}

impl Variant {
    /// Control-lag variants for `p` in `orders`.
    pub fn lag_orders(orders: impl IntoIterator<Item = usize>) -> Vec<Variant> {
        orders.into_iter().map(Variant::ControlLags).collect()
    }

    /// Moderator variants with the baseline lag and centering.
    pub fn moderators<S: Into<String>>(
        base: &LpConfig, variables: impl IntoIterator<Item = S>,
    ) -> Vec<Variant> {
        let template = base.moderator.clone().unwrap_or_else(|| Moderator::new(String::new()));
        variables
            .into_iter()
            .map(|v| Variant::Moderator(Moderator { variable: v.into(), ..template.clone() }))
            .collect()
    }

    pub fn label(&self) -> String {
        match self {
            Variant::Baseline => "baseline".to_string(),
            Variant::Moderator(m) => format!("moderator={}", m.key()),
            Variant::Controls(c) => format!("controls=[{}]", c.join(", ")),
            Variant::ControlLags(p) => format!("lags={p}"),
            Variant::ExcludeEntity(e) => format!("excluding {e}"),
            Variant::PeriodWindow { start, end } => format!("{start}-{end}"),
        }
    }

    /// Configuration and panel of this variant.
    ///
    /// Errors
    /// ------
    /// - `DiagnosticError::DegenerateInput` if the excluded entity is not in
    ///   the panel.
    /// - `DiagnosticError::Panel` if the subsample is empty.
    pub fn apply<'p>(
        &self, base: &LpConfig, panel: &'p Panel,
    ) -> DiagnosticResult<(LpConfig, Cow<'p, Panel>)> {
        let cfg = base.clone();
        Ok(match self {
            Variant::Baseline => (cfg, Cow::Borrowed(panel)),
            Variant::Moderator(m) => (cfg.with_moderator(m.clone()), Cow::Borrowed(panel)),
            Variant::Controls(c) => (cfg.with_controls(c.iter().cloned()), Cow::Borrowed(panel)),
            Variant::ControlLags(p) => (cfg.with_control_lags(*p), Cow::Borrowed(panel)),
            Variant::ExcludeEntity(e) => {
                if !panel.entities().contains(e) {
                    return Err(DiagnosticError::degenerate(
                        "robustness",
                        format!("entity `{e}` is not in the panel"),
                    ));
                }
                (cfg, Cow::Owned(panel.retain_entities(|name| name != e)?))
            }
            Variant::PeriodWindow { start, end } => {
                (cfg, Cow::Owned(panel.restrict_periods(*start..=*end)?))
            }
        })
    }
}

/// Interaction coefficient at one horizon of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionPoint {
    pub horizon: usize,
    pub estimate: f64,
    pub std_error: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Interaction path of one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionReport {
    pub variant: String,
    pub coefficient: String,
    pub points: Vec<InteractionPoint>,
}

impl InteractionReport {
    pub fn any_significant(&self) -> bool {
        self.points.iter().any(|p| p.significant)
    }
}

/// Multiplier table of one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierReport {
    pub variant: String,
    pub table: MultiplierTable,
}

/// Interaction paths of `base` under each variant.
///
/// Errors
/// ------
/// - `DiagnosticError::MissingModerator` if `base` has no moderator.
/// - Configuration and unknown-variable errors of any variant.
pub fn interaction_robustness(
    resolver: &mut SeriesResolver<'_>, base: &LpConfig, variants: &[Variant],
) -> DiagnosticResult<Vec<DiagnosticOutcome<InteractionReport>>> {
    if base.moderator.is_none() {
        return Err(DiagnosticError::MissingModerator { test: "interaction_robustness" });
    }
    variants
        .iter()
        .map(|variant| {
            let label = variant.label();
            let report = run_variant(resolver, base, variant, |cfg, r| {
                let irf = LocalProjection::new(cfg.clone()).estimate_with(r)?;
                interaction_report(&irf, label.clone())
            });
            DiagnosticOutcome::settle(format!("robustness {label}"), report)
        })
        .collect()
}

/// Multiplier tables of `spec` under each variant.
///
/// Errors
/// ------
/// - Configuration and unknown-variable errors of any variant.
pub fn multiplier_robustness(
    resolver: &mut SeriesResolver<'_>, spec: &MultiplierSpec, variants: &[Variant],
) -> DiagnosticResult<Vec<DiagnosticOutcome<MultiplierReport>>> {
    variants
        .iter()
        .map(|variant| {
            let label = variant.label();
            let report = run_variant(resolver, &spec.base, variant, |cfg, r| {
                let estimate = spec.clone().with_base(cfg.clone()).estimate_with(r)?;
                Ok(MultiplierReport { variant: label.clone(), table: estimate.table })
            });
            DiagnosticOutcome::settle(format!("multiplier {label}"), report)
        })
        .collect()
}

/// Responses at one quantile pair of the moderator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileResponses {
    pub q_low: f64,
    pub q_high: f64,
    pub c_low: f64,
    pub c_high: f64,
    pub responses: Vec<ConditionalResponse>,
}

/// `β_h + θ_h·c` at the low and high moderator values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalResponse {
    pub horizon: usize,
    pub low: f64,
    pub high: f64,
    pub difference: f64,
}

/// Conditional responses of `irf` at each quantile pair.
///
/// Moderator values are taken as the projection used them: lagged, and
/// centered at their panel mean when the moderator is centered.
///
/// Errors
/// ------
/// - `DiagnosticError::MissingModerator` if the IRF has no interaction.
/// - `DiagnosticError::Projection` (skippable) if a horizon failed.
/// - `DiagnosticError::DegenerateInput` if the moderator is never defined.
pub fn conditional_responses(
    resolver: &mut SeriesResolver<'_>, irf: &Irf, pairs: &[(f64, f64)],
) -> DiagnosticResult<Vec<QuantileResponses>> {
    let cfg = &irf.config;
    let (moderator, interaction) = cfg
        .moderator
        .as_ref()
        .zip(cfg.interaction_name())
        .ok_or(DiagnosticError::MissingModerator { test: "conditional_responses" })?;
    let betas = irf.coefficients(&cfg.shock_name())?;
    let thetas = irf.coefficients(&interaction)?;

    let lagged = resolver.resolve(&moderator.key())?;
    let shift = if moderator.center { defined_mean(&lagged).unwrap_or(0.0) } else { 0.0 };
    let mut values: Vec<f64> = lagged.iter().flatten().map(|v| v - shift).collect();
    if values.is_empty() {
        return Err(DiagnosticError::degenerate(
            "conditional_responses",
            format!("`{}` has no defined value", moderator.key()),
        ));
    }
    values.sort_by(f64::total_cmp);

    Ok(pairs
        .iter()
        .map(|&(q_low, q_high)| {
            let c_low = quantile(&values, q_low);
            let c_high = quantile(&values, q_high);
            let responses = betas
                .iter()
                .zip(&thetas)
                .enumerate()
                .map(|(h, (b, t))| {
                    let low = b.estimate + t.estimate * c_low;
                    let high = b.estimate + t.estimate * c_high;
                    ConditionalResponse { horizon: h, low, high, difference: high - low }
                })
                .collect();
            QuantileResponses { q_low, q_high, c_low, c_high, responses }
        })
        .collect())
}

/// Linearly interpolated quantile of sorted, non-empty `sorted`.
///
/// `q` is clamped to `[0, 1]`; position `q·(n−1)` is interpolated between
/// the neighbouring order statistics.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len().saturating_sub(1);
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    match (sorted.get(lo), sorted.get(hi)) {
        (Some(a), Some(b)) => a + (pos - lo as f64) * (b - a),
        _ => f64::NAN,
    }
}

// ---- Helper methods ----

/// Apply `variant` and call `f` with its configuration and a resolver over
/// its panel; configuration-only variants reuse `resolver`.
fn run_variant<T, F>(
    resolver: &mut SeriesResolver<'_>, base: &LpConfig, variant: &Variant, mut f: F,
) -> DiagnosticResult<T>
where
    F: FnMut(&LpConfig, &mut SeriesResolver<'_>) -> DiagnosticResult<T>,
{
    let (cfg, panel) = variant.apply(base, resolver.panel())?;
    match panel {
        Cow::Borrowed(_) => f(&cfg, resolver),
        Cow::Owned(sub) => {
            let mut sub_resolver = SeriesResolver::new(&sub);
            f(&cfg, &mut sub_resolver)
        }
    }
}

fn interaction_report(irf: &Irf, variant: String) -> DiagnosticResult<InteractionReport> {
    let coefficient = irf
        .config
        .interaction_name()
        .ok_or(DiagnosticError::MissingModerator { test: "interaction_robustness" })?;
    let points = irf
        .coefficients(&coefficient)?
        .into_iter()
        .enumerate()
        .map(|(h, c)| InteractionPoint {
            horizon: h,
            estimate: c.estimate,
            std_error: c.std_error,
            p_value: c.p_value,
            significant: c.is_significant(ROBUSTNESS_LEVEL),
        })
        .collect();
    Ok(InteractionReport { variant, coefficient, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        multiplier::pipeline::mean_share,
        panel::data::Observation,
        projection::config::DependentForm,
    };
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Variant labels and their effect on configuration and panel.
    // - Interaction paths that stay significant across variants.
    // - Mean-share re-derivation on subsamples.
    // - Quantile interpolation and conditional responses.
    // -------------------------------------------------------------------------

    const ENTITIES: [&str; 5] = ["A", "B", "C", "D", "E"];

    /// 5 × 12 panel; `y` responds to `s` with slope `1 + L1.m`, the ratio
    /// `r` responds to `s` with slope 0.01 around an entity-specific level.
    fn panel() -> Panel {
        let mut obs = Vec::new();
        for (i, e) in ENTITIES.iter().enumerate() {
            let i = i as i64;
            for t in 0..12_i64 {
                let s = (((i + 3) * (t + 2) * 5) % 11) as f64 - 5.0;
                let m = ((i + 2 * t) % 5) as f64 * 0.5;
                let m_lag = ((i + 2 * (t - 1)).rem_euclid(5)) as f64 * 0.5;
                let wiggle = 0.01 * ((i * 7 + t) as f64).sin();
                obs.push(
                    Observation::new(*e, 2000 + t)
                        .with("s", s)
                        .with("m", m)
                        .with("m2", 2.0 * m + 1.0)
                        .with("c", ((i + t) as f64 * 0.8).cos())
                        .with("y", s * (1.0 + m_lag) + wiggle)
                        .with("r", 0.1 * (i + 1) as f64 + 0.01 * s + 0.001 * wiggle),
                );
            }
        }
        Panel::from_observations(obs).unwrap()
    }

    fn base() -> LpConfig {
        LpConfig::new("y", "s")
            .with_moderator(Moderator::new("m"))
            .with_controls(["c"])
            .with_dependent(DependentForm::Level)
            .with_horizons(0)
    }

    #[test]
    fn variants_change_one_thing() {
        let panel = panel();
        let base = base();

        let (cfg, sub) = Variant::ControlLags(3).apply(&base, &panel).unwrap();
        assert_eq!(cfg.control_lags, 3);
        assert!(matches!(sub, Cow::Borrowed(_)));

        let (cfg, sub) = Variant::ExcludeEntity("C".into()).apply(&base, &panel).unwrap();
        assert_eq!(cfg, base);
        assert_eq!(sub.n_entities(), 4);

        let (_, sub) = Variant::PeriodWindow { start: 2000, end: 2005 }.apply(&base, &panel).unwrap();
        assert_eq!(sub.periods(), (2000..=2005).collect::<Vec<_>>());

        let mods = Variant::moderators(&base, ["m2"]);
        assert_eq!(mods[0].label(), "moderator=L1.m2");
        assert!(Variant::ExcludeEntity("Z".into()).apply(&base, &panel).unwrap_err().is_skippable());
    }

    #[test]
    // Purpose
    // -------
    // The true interaction slope is 1 on the full panel and on every
    // subsample, so each variant reports θ ≈ 1 flagged as significant.
    fn interaction_is_stable_across_variants() {
        // Arrange
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let mut variants = vec![Variant::Baseline];
        variants.extend(Variant::lag_orders([1, 2, 3]));
        variants.push(Variant::ExcludeEntity("A".into()));
        variants.push(Variant::PeriodWindow { start: 2000, end: 2009 });

        // Act
        let reports = interaction_robustness(&mut resolver, &base(), &variants).unwrap();

        // Assert
        assert_eq!(reports.len(), variants.len());
        for outcome in &reports {
            let report = outcome.completed().unwrap();
            assert_eq!(report.coefficient, "s:L1.m");
            assert_relative_eq!(report.points[0].estimate, 1.0, epsilon = 0.05);
            assert!(report.any_significant(), "{}", report.variant);
        }
        assert_eq!(reports[1].completed().unwrap().variant, "lags=1");
    }

    #[test]
    fn interaction_robustness_requires_a_moderator() {
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let cfg = base().without_moderator();
        assert!(matches!(
            interaction_robustness(&mut resolver, &cfg, &[Variant::Baseline]),
            Err(DiagnosticError::MissingModerator { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Excluding an entity changes the mean share used as the multiplier
    // weight, because the weight is re-derived from the subsample.
    fn subsample_rederives_mean_share() {
        // Arrange
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let cfg = LpConfig::new("y", "s").with_controls(["c"]).with_control_lags(1).with_horizons(1);
        let spec = MultiplierSpec::new(cfg, "r");
        let variants = [Variant::Baseline, Variant::ExcludeEntity("E".into())];

        // Act
        let reports = multiplier_robustness(&mut resolver, &spec, &variants).unwrap();

        // Assert
        let full = reports[0].completed().unwrap();
        let sub = reports[1].completed().unwrap();
        let sub_panel = panel.retain_entities(|e| e != "E").unwrap();
        assert_relative_eq!(full.table.weight, mean_share(&panel, "r").unwrap(), epsilon = 1e-12);
        assert_relative_eq!(sub.table.weight, mean_share(&sub_panel, "r").unwrap(), epsilon = 1e-12);
        assert!(sub.table.weight < full.table.weight);
        assert_eq!(sub.table.rows.len(), 2);
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let sorted = [1.0, 2.0, 4.0, 8.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 8.0);
        // Position 0.5 · 3 = 1.5, halfway between 2 and 4.
        assert_relative_eq!(quantile(&sorted, 0.5), 3.0, epsilon = 1e-15);
        assert_relative_eq!(quantile(&sorted, 0.25), 1.75, epsilon = 1e-15);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    // Purpose
    // -------
    // Conditional responses are `β + θ·c` at the quantiles of the centered
    // lagged moderator, and their difference is `θ·(c_high − c_low)`.
    fn conditional_responses_follow_the_linear_formula() {
        // Arrange
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let irf = LocalProjection::new(base()).estimate_with(&mut resolver).unwrap();

        // Act
        let pairs = conditional_responses(&mut resolver, &irf, &DEFAULT_QUANTILE_PAIRS).unwrap();

        // Assert
        assert_eq!(pairs.len(), 3);
        let h0 = irf.horizon(0).unwrap();
        let (beta, theta) = (h0.coefficients[0].estimate, h0.coefficients[1].estimate);
        for pair in &pairs {
            assert!(pair.c_low <= pair.c_high);
            let r = &pair.responses[0];
            assert_relative_eq!(r.low, beta + theta * pair.c_low, epsilon = 1e-12);
            assert_relative_eq!(r.difference, theta * (pair.c_high - pair.c_low), epsilon = 1e-12);
        }
        assert!(pairs[0].c_high - pairs[0].c_low >= pairs[2].c_high - pairs[2].c_low);
    }
}
