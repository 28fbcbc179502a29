//! estimation::design — per-regression design-matrix assembly.
//!
//! Purpose
//! -------
//! Turn a declarative [`DesignSpec`] (dependent variable plus a list of
//! typed regressors) into a dense, row-aligned [`DesignMatrix`] ready for
//! the two-way fixed-effects solver. All shifted series are resolved through
//! a [`SeriesResolver`], so repeated horizons and diagnostic re-runs on the
//! same panel share derived columns.
//!
//! Key behaviors
//! -------------
//! - [`Dependent::Series`] uses one series as-is (`lead_h(y)` in level
//!   form); [`Dependent::Change`] subtracts a start series from an end
//!   series (`lead_h(y) − lag_1(y)` in cumulative form).
//! - [`Regressor::Interaction`] multiplies a shock by a moderator series,
//!   optionally after subtracting the moderator's panel-wide mean over all
//!   defined values.
//! - Listwise deletion is local to one design: a row is kept iff the
//!   dependent value and every regressor are defined *for this design*.
//!
//! Invariants & assumptions
//! ------------------------
//! - No intercept column is added; the fixed effects absorb it.
//! - Kept rows preserve the panel's `(entity, time)` order.
//! - Entity and period indices in the output are dense and refer only to
//!   groups present in the kept rows; period indices follow calendar order.
//!
//! Conventions
//! -----------
//! - Regressor names use the `SeriesKey` display form (`L1.debt`,
//!   `shock:L1.debt` for interactions).
use crate::{
    estimation::errors::EstimationResult,
    panel::{
        data::{PanelKey, defined_mean},
        shift::{SeriesKey, SeriesResolver},
    },
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Dependent-variable definition for one regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dependent {
    /// Use the series directly.
    Series(SeriesKey),
    /// `end − start`, defined where both are.
    Change { end: SeriesKey, start: SeriesKey },
}

impl Dependent {
    fn resolve(&self, resolver: &mut SeriesResolver<'_>) -> EstimationResult<Vec<Option<f64>>> {
        match self {
            Dependent::Series(key) => Ok(resolver.resolve(key)?.to_vec()),
            Dependent::Change { end, start } => {
                let end = resolver.resolve(end)?;
                let start = resolver.resolve(start)?;
                Ok(end.iter().zip(start.iter()).map(|(e, s)| Some((*e)? - (*s)?)).collect())
            }
        }
    }
}

impl fmt::Display for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependent::Series(key) => write!(f, "{key}"),
            Dependent::Change { end, start } => write!(f, "{end}-{start}"),
        }
    }
}

/// One right-hand-side column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Regressor {
    Series(SeriesKey),
    /// `shock × (moderator − center)`, where `center` is the mean of all
    /// defined moderator values when `center` is set and zero otherwise.
    Interaction { shock: SeriesKey, moderator: SeriesKey, center: bool },
}

impl Regressor {
    pub fn name(&self) -> String {
        match self {
            Regressor::Series(key) => key.to_string(),
            Regressor::Interaction { shock, moderator, .. } => format!("{shock}:{moderator}"),
        }
    }

    fn resolve(&self, resolver: &mut SeriesResolver<'_>) -> EstimationResult<Vec<Option<f64>>> {
        match self {
            Regressor::Series(key) => Ok(resolver.resolve(key)?.to_vec()),
            Regressor::Interaction { shock, moderator, center } => {
                let shock = resolver.resolve(shock)?;
                let moderator = resolver.resolve(moderator)?;
                let offset = if *center { defined_mean(&moderator).unwrap_or(0.0) } else { 0.0 };
                Ok(shock
                    .iter()
                    .zip(moderator.iter())
                    .map(|(s, m)| Some((*s)? * ((*m)? - offset)))
                    .collect())
            }
        }
    }
}

/// DesignSpec — declarative description of one regression.
///
/// Fields
/// ------
/// - `dependent`: left-hand side.
/// - `regressors`: right-hand-side columns, in coefficient order.
/// - `horizon`: projection horizon the design belongs to (`0` for
///   horizon-free regressions).
/// - `label`: human-readable configuration tag carried into errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSpec {
    pub dependent: Dependent,
    pub regressors: Vec<Regressor>,
    pub horizon: usize,
    pub label: String,
}

impl DesignSpec {
    pub fn new(dependent: Dependent, regressors: Vec<Regressor>, horizon: usize) -> Self {
        let label = format!(
            "{} ~ {}",
            dependent,
            regressors.iter().map(Regressor::name).collect::<Vec<_>>().join(" + ")
        );
        DesignSpec { dependent, regressors, horizon, label }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// DesignMatrix — dense, listwise-complete rows of one regression.
///
/// Fields
/// ------
/// - `keys`: `(entity, time)` of each kept row.
/// - `panel_rows`: row index of each kept row in the source panel.
/// - `entity`, `period`: dense group indices, `0..n_entities` and
///   `0..n_periods`.
/// - `periods`: calendar period of each dense period index.
/// - `y`: dependent values, length `N`.
/// - `x`: `N×K` regressor values.
/// - `names`: regressor names, length `K`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    pub keys: Vec<PanelKey>,
    pub panel_rows: Vec<usize>,
    pub entity: Vec<usize>,
    pub period: Vec<usize>,
    pub n_entities: usize,
    pub periods: Vec<i64>,
    pub y: Array1<f64>,
    pub x: Array2<f64>,
    pub names: Vec<String>,
    pub horizon: usize,
    pub label: String,
}

impl DesignMatrix {
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    pub fn n_regressors(&self) -> usize {
        self.x.ncols()
    }

    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    /// Column index of the regressor called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Assemble the design described by `spec`.
///
/// Parameters
/// ----------
/// - `resolver`: memo of derived series over the source panel.
/// - `spec`: dependent variable, regressors, horizon, label.
///
/// Returns
/// -------
/// `EstimationResult<DesignMatrix>`
///   Possibly empty: an empty design is not an error here, the solver
///   reports it as insufficient data for the horizon.
///
/// Errors
/// ------
/// - `EstimationError::Panel` if any referenced variable is unknown.
pub fn build_design(
    resolver: &mut SeriesResolver<'_>, spec: &DesignSpec,
) -> EstimationResult<DesignMatrix> {
    let panel = resolver.panel();
    let dependent = spec.dependent.resolve(resolver)?;
    let columns = spec
        .regressors
        .iter()
        .map(|r| r.resolve(resolver))
        .collect::<EstimationResult<Vec<_>>>()?;

    let kept: Vec<usize> = (0..panel.n_rows())
        .filter(|&row| dependent[row].is_some() && columns.iter().all(|c| c[row].is_some()))
        .collect();

    let mut entity_ids: BTreeMap<usize, usize> = BTreeMap::new();
    let mut period_ids: BTreeMap<i64, usize> = BTreeMap::new();
    for &row in &kept {
        let next = entity_ids.len();
        entity_ids.entry(panel.entity_of(row)).or_insert(next);
        period_ids.insert(panel.time_of(row), 0);
    }
    for (dense, slot) in period_ids.values_mut().enumerate() {
        *slot = dense;
    }

    let n = kept.len();
    let k = columns.len();
    let mut x = Array2::<f64>::zeros((n, k));
    let mut y = Array1::<f64>::zeros(n);
    for (i, &row) in kept.iter().enumerate() {
        y[i] = dependent[row].unwrap_or_default();
        for (j, column) in columns.iter().enumerate() {
            x[[i, j]] = column[row].unwrap_or_default();
        }
    }

    Ok(DesignMatrix {
        keys: kept.iter().map(|&row| panel.key(row)).collect(),
        entity: kept.iter().map(|&row| entity_ids[&panel.entity_of(row)]).collect(),
        period: kept.iter().map(|&row| period_ids[&panel.time_of(row)]).collect(),
        panel_rows: kept,
        n_entities: entity_ids.len(),
        periods: period_ids.into_keys().collect(),
        y,
        x,
        names: spec.regressors.iter().map(Regressor::name).collect(),
        horizon: spec.horizon,
        label: spec.label.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        estimation::errors::EstimationError,
        panel::data::{Observation, Panel},
    };
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Cumulative versus level dependent variables.
    // - Per-design listwise deletion.
    // - Centered interaction terms.
    // - Dense entity/period indexing and unknown-variable errors.
    // -------------------------------------------------------------------------

    /// Two entities over 2000..=2003; `x` is missing for B in 2001.
    fn panel() -> Panel {
        let mut obs = Vec::new();
        for (e, base) in [("A", 0.0), ("B", 10.0)] {
            for t in 0..4 {
                let mut o = Observation::new(e, 2000 + t)
                    .with("y", base + (t * t) as f64)
                    .with("s", (t as f64) - 1.5)
                    .with("m", base + t as f64);
                if !(e == "B" && t == 1) {
                    o = o.with("x", 1.0 + t as f64);
                }
                obs.push(o);
            }
        }
        Panel::from_observations(obs).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The cumulative form is `lead_h(y) − lag_1(y)` and the level form is
    // `lead_h(y)`, row for row.
    //
    // Given
    // -----
    // - Horizon 1 designs with the shock as the only regressor.
    //
    // Expect
    // ------
    // - Each kept row matches the direct computation from the panel.
    fn dependent_forms_match_direct_shifts() {
        // Arrange
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let shock = vec![Regressor::Series(SeriesKey::level("s"))];
        let cumulative = DesignSpec::new(
            Dependent::Change { end: SeriesKey::lead("y", 1), start: SeriesKey::lag("y", 1) },
            shock.clone(),
            1,
        );
        let level = DesignSpec::new(Dependent::Series(SeriesKey::lead("y", 1)), shock, 1);

        // Act
        let cum = build_design(&mut resolver, &cumulative).unwrap();
        let lev = build_design(&mut resolver, &level).unwrap();

        // Assert
        let lead = panel.lead("y", 1).unwrap();
        let lag = panel.lag("y", 1).unwrap();
        for (i, &row) in cum.panel_rows.iter().enumerate() {
            assert_relative_eq!(cum.y[i], lead[row].unwrap() - lag[row].unwrap(), epsilon = 1e-12);
        }
        for (i, &row) in lev.panel_rows.iter().enumerate() {
            assert_eq!(lev.y[i], lead[row].unwrap());
        }
        // Cumulative loses first and last period per entity, level only the last.
        assert_eq!(cum.n_obs(), 4);
        assert_eq!(lev.n_obs(), 6);
    }

    #[test]
    // Purpose
    // -------
    // A row missing only `L1.x` is dropped from designs that use `L1.x` but
    // kept by designs that do not.
    fn listwise_deletion_is_local_to_the_design() {
        // Arrange
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let dep = Dependent::Series(SeriesKey::level("y"));
        let with_lag = DesignSpec::new(
            dep.clone(),
            vec![Regressor::Series(SeriesKey::level("s")), Regressor::Series(SeriesKey::lag("x", 1))],
            0,
        );
        let without = DesignSpec::new(dep, vec![Regressor::Series(SeriesKey::level("s"))], 0);

        // Act
        let a = build_design(&mut resolver, &with_lag).unwrap();
        let b = build_design(&mut resolver, &without).unwrap();

        // Assert
        let b2002 = PanelKey::new("B", 2002);
        assert!(!a.keys.contains(&b2002));
        assert!(b.keys.contains(&b2002));
        assert_eq!(b.n_obs(), 8);
        assert_eq!(a.names, vec!["s".to_string(), "L1.x".to_string()]);
    }

    #[test]
    fn centered_interaction_subtracts_panel_wide_moderator_mean() {
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let spec = DesignSpec::new(
            Dependent::Series(SeriesKey::level("y")),
            vec![Regressor::Interaction {
                shock: SeriesKey::level("s"),
                moderator: SeriesKey::lag("m", 1),
                center: true,
            }],
            0,
        );

        let design = build_design(&mut resolver, &spec).unwrap();

        // Defined L1.m values: A 0,1,2 and B 10,11,12 → mean 6.
        let s = panel.series("s").unwrap();
        let m1 = panel.lag("m", 1).unwrap();
        for (i, &row) in design.panel_rows.iter().enumerate() {
            assert_relative_eq!(
                design.x[[i, 0]],
                s[row].unwrap() * (m1[row].unwrap() - 6.0),
                epsilon = 1e-12
            );
        }
        assert_eq!(design.names[0], "s:L1.m");
    }

    #[test]
    fn dense_indices_cover_only_kept_groups() {
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let spec = DesignSpec::new(
            Dependent::Series(SeriesKey::lead("y", 2)),
            vec![Regressor::Series(SeriesKey::level("s"))],
            2,
        );

        let design = build_design(&mut resolver, &spec).unwrap();

        assert_eq!(design.periods, vec![2000, 2001]);
        assert_eq!(design.n_entities, 2);
        assert_eq!(design.period, vec![0, 1, 0, 1]);
        assert_eq!(design.entity, vec![0, 0, 1, 1]);
    }

    #[test]
    fn unknown_variable_is_surfaced() {
        let panel = panel();
        let mut resolver = SeriesResolver::new(&panel);
        let spec = DesignSpec::new(
            Dependent::Series(SeriesKey::level("gdp")),
            vec![Regressor::Series(SeriesKey::level("s"))],
            0,
        );
        assert!(matches!(build_design(&mut resolver, &spec), Err(EstimationError::Panel(_))));
    }
}
