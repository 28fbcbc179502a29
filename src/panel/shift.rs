//! panel::shift — typed lag/lead/difference transforms and their memo cache.
//!
//! Purpose
//! -------
//! Derive shifted series from a [`Panel`] without ever reordering its rows.
//! Derived series are addressed by a typed [`SeriesKey`]
//! `(base variable, shift kind, shift amount)` instead of synthesized column
//! names, and can be memoized per panel through [`SeriesResolver`].
//!
//! Key behaviors
//! -------------
//! - `lag(s, k)` at `(i, t)` is `s(i, t−k)` if entity `i` observes period
//!   `t−k`, otherwise missing; shifts never cross entity boundaries or gaps.
//! - `lead(s, h)` is the symmetric shift into the future.
//! - `difference(s, k)` is `s(i, t) − s(i, t−k)`.
//! - [`Panel::multi_lag`] produces lag-1..lag-p of several variables in one
//!   pass over the panel.
//!
//! Invariants & assumptions
//! ------------------------
//! - `lag(lead(s, h), h) == s` wherever both sides are defined.
//! - Shift amount 0 is normalized to [`ShiftKind::Level`], so
//!   `SeriesKey::lead(v, 0) == SeriesKey::level(v)`.
//!
//! Conventions
//! -----------
//! - Shifts are defined on calendar periods, not row positions: a missing
//!   year inside an entity produces missing lags across the gap.
//! - Display form follows the usual time-series operator notation:
//!   `x`, `L2.x`, `F1.x`, `D1.x`.
use crate::panel::{
    data::{Panel, Series},
    errors::PanelResult,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

/// Kind of transform applied to a base variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShiftKind {
    Level,
    Lag,
    Lead,
    Difference,
}

/// SeriesKey — typed name of a (possibly shifted) panel series.
///
/// Fields
/// ------
/// - `base`: name of the underlying panel column.
/// - `kind`: [`ShiftKind`] applied to it.
/// - `amount`: number of periods shifted; always `0` for `Level` and `≥ 1`
///   otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub base: String,
    pub kind: ShiftKind,
    pub amount: usize,
}

impl SeriesKey {
    pub fn level(base: impl Into<String>) -> Self {
        SeriesKey { base: base.into(), kind: ShiftKind::Level, amount: 0 }
    }

    pub fn lag(base: impl Into<String>, k: usize) -> Self {
        Self::shifted(base, ShiftKind::Lag, k)
    }

    pub fn lead(base: impl Into<String>, h: usize) -> Self {
        Self::shifted(base, ShiftKind::Lead, h)
    }

    pub fn difference(base: impl Into<String>, k: usize) -> Self {
        Self::shifted(base, ShiftKind::Difference, k)
    }

    /// Signed period offset of the shifted value (`lag k` → `−k`).
    pub fn offset(&self) -> i64 {
        match self.kind {
            ShiftKind::Level | ShiftKind::Difference => 0,
            ShiftKind::Lag => -(self.amount as i64),
            ShiftKind::Lead => self.amount as i64,
        }
    }

    fn shifted(base: impl Into<String>, kind: ShiftKind, amount: usize) -> Self {
        if amount == 0 {
            Self::level(base)
        } else {
            SeriesKey { base: base.into(), kind, amount }
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ShiftKind::Level => write!(f, "{}", self.base),
            ShiftKind::Lag => write!(f, "L{}.{}", self.amount, self.base),
            ShiftKind::Lead => write!(f, "F{}.{}", self.amount, self.base),
            ShiftKind::Difference => write!(f, "D{}.{}", self.amount, self.base),
        }
    }
}

impl Panel {
    /// `lag_k(name)`: value `k` periods earlier within the same entity.
    pub fn lag(&self, name: &str, k: usize) -> PanelResult<Series> {
        self.shifted(&SeriesKey::lag(name, k))
    }

    /// `lead_h(name)`: value `h` periods later within the same entity.
    pub fn lead(&self, name: &str, h: usize) -> PanelResult<Series> {
        self.shifted(&SeriesKey::lead(name, h))
    }

    /// `Δ_k name = name − lag_k(name)`.
    pub fn difference(&self, name: &str, k: usize) -> PanelResult<Series> {
        self.shifted(&SeriesKey::difference(name, k))
    }

    /// Materialize the series addressed by `key`.
    ///
    /// Errors
    /// ------
    /// - `PanelError::UnknownVariable` if `key.base` is not a column.
    pub fn shifted(&self, key: &SeriesKey) -> PanelResult<Series> {
        let base = self.series(&key.base)?;
        let out = match key.kind {
            ShiftKind::Level => base.to_vec(),
            ShiftKind::Lag | ShiftKind::Lead => self.shift_by(base, key.offset()),
            ShiftKind::Difference => {
                let lagged = self.shift_by(base, -(key.amount as i64));
                base.iter()
                    .zip(&lagged)
                    .map(|(now, before)| Some((*now)? - (*before)?))
                    .collect()
            }
        };
        Ok(out)
    }

    /// Lag-1..lag-`max_lag` of every variable in `names`, keyed by
    /// [`SeriesKey`].
    ///
    /// Each base column is looked up once and each row resolves its source
    /// rows with one search per lag.
    ///
    /// Errors
    /// ------
    /// - `PanelError::UnknownVariable` for the first unresolvable name.
    pub fn multi_lag<S: AsRef<str>>(
        &self, names: &[S], max_lag: usize,
    ) -> PanelResult<BTreeMap<SeriesKey, Series>> {
        let mut out = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let base = self.series(name)?;
            for k in 1..=max_lag {
                out.insert(SeriesKey::lag(name, k), self.shift_by(base, -(k as i64)));
            }
        }
        Ok(out)
    }

    /// Shift `values` by `offset` calendar periods within each entity.
    fn shift_by(&self, values: &[Option<f64>], offset: i64) -> Series {
        (0..self.n_rows())
            .map(|row| {
                let target = self.time_of(row) + offset;
                self.find_row(self.entity_of(row), target).and_then(|src| values[src])
            })
            .collect()
    }
}

/// SeriesResolver — per-panel memo of derived series.
///
/// Purpose
/// -------
/// Avoid recomputing the same lag/lead column across horizons and across
/// diagnostic re-estimations on one panel. The cache is tied to the
/// borrowed panel's lifetime, so entries can never leak across panels.
///
/// Notes
/// -----
/// - Entries are `Arc`-shared slices; handing one out is a reference-count
///   bump, not a copy.
#[derive(Debug)]
pub struct SeriesResolver<'p> {
    panel: &'p Panel,
    memo: HashMap<SeriesKey, Arc<[Option<f64>]>>,
}

impl<'p> SeriesResolver<'p> {
    pub fn new(panel: &'p Panel) -> Self {
        SeriesResolver { panel, memo: HashMap::new() }
    }

    pub fn panel(&self) -> &'p Panel {
        self.panel
    }

    /// Resolve `key`, computing and caching it on first use.
    pub fn resolve(&mut self, key: &SeriesKey) -> PanelResult<Arc<[Option<f64>]>> {
        if let Some(hit) = self.memo.get(key) {
            return Ok(Arc::clone(hit));
        }
        let series: Arc<[Option<f64>]> = self.panel.shifted(key)?.into();
        self.memo.insert(key.clone(), Arc::clone(&series));
        Ok(series)
    }

    /// Number of memoized series.
    pub fn cached(&self) -> usize {
        self.memo.len()
    }
}
