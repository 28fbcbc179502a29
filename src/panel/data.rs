//! panel::data — immutable `(entity, time)`-indexed observation table.
//!
//! Purpose
//! -------
//! Store a macro panel (countries × years) in a layout that makes per-entity
//! shifts cheap and unambiguous. Rows are kept in a stable `(entity, time)`
//! order, every entity occupies one contiguous block of rows, and each
//! variable is a column of optional values (`None` = missing).
//!
//! Key behaviors
//! -------------
//! - Build a [`Panel`] from row-wise [`Observation`]s or from columns,
//!   rejecting duplicate `(entity, time)` keys.
//! - Look up variables by name, failing with
//!   [`PanelError::UnknownVariable`] rather than silently returning
//!   missing data.
//! - Derive new panels (entity exclusion, period windows, added columns)
//!   without mutating the original.
//!
//! Invariants & assumptions
//! ------------------------
//! - Within an entity, periods are unique and strictly increasing by row.
//! - `entities` is sorted and unique; `blocks[e]` is the row range of
//!   entity `e`.
//! - Non-finite inputs are stored as missing.
//!
//! Conventions
//! -----------
//! - Time periods are integer years (`i64`); gaps are allowed and are
//!   respected by the shift transforms in [`crate::panel::shift`].
//! - Ownership: callers own the panel; every core routine takes `&Panel`.
use crate::panel::errors::{PanelError, PanelResult};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    ops::{Range, RangeInclusive},
};

/// A column of optional values aligned with the panel's rows.
pub type Series = Vec<Option<f64>>;

/// Row key of a panel: entity identifier and time period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelKey {
    pub entity: String,
    pub time: i64,
}

impl PanelKey {
    pub fn new(entity: impl Into<String>, time: i64) -> Self {
        PanelKey { entity: entity.into(), time }
    }
}

/// One observation: an entity, a period, and named numeric values.
///
/// Variables absent from `values` (or stored as non-finite numbers) are
/// treated as missing for that row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub entity: String,
    pub time: i64,
    pub values: BTreeMap<String, f64>,
}

impl Observation {
    pub fn new(entity: impl Into<String>, time: i64) -> Self {
        Observation { entity: entity.into(), time, values: BTreeMap::new() }
    }

    /// Builder-style setter for one variable.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

/// Panel — immutable table of observations keyed by `(entity, time)`.
///
/// Purpose
/// -------
/// Serve as the read-only input to every estimation routine. The layout
/// (sorted rows, contiguous entity blocks) is what makes the lag/lead
/// transforms well defined.
///
/// Fields
/// ------
/// - `entities`: sorted unique entity identifiers.
/// - `entity_of`: entity index of each row.
/// - `time_of`: period of each row.
/// - `blocks`: row range of each entity.
/// - `columns`: variable name → per-row optional values.
///
/// Invariants
/// ----------
/// - No duplicate `(entity, time)` keys.
/// - `time_of` is strictly increasing inside every block.
/// - Every column has exactly `n_rows()` entries.
///
/// Serialization
/// -------------
/// Serialized as row keys plus named columns. Deserialization goes through
/// [`Panel::from_columns`], so the invariants hold for panels read back
/// from disk as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PanelRecord", try_from = "PanelRecord")]
pub struct Panel {
    entities: Vec<String>,
    entity_of: Vec<usize>,
    time_of: Vec<i64>,
    blocks: Vec<Range<usize>>,
    columns: BTreeMap<String, Series>,
}

impl Panel {
    /// Build a panel from row-wise observations.
    ///
    /// Parameters
    /// ----------
    /// - `observations`: any iterable of [`Observation`]. Order does not
    ///   matter; rows are stably sorted by `(entity, time)`.
    ///
    /// Returns
    /// -------
    /// `PanelResult<Panel>`
    ///   The sorted panel; the variable set is the union of all names seen.
    ///
    /// Errors
    /// ------
    /// - `PanelError::Empty` if no observations are supplied.
    /// - `PanelError::DuplicateKey` if two observations share a key.
    pub fn from_observations<I>(observations: I) -> PanelResult<Self>
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut rows: Vec<Observation> = observations.into_iter().collect();
        if rows.is_empty() {
            return Err(PanelError::Empty);
        }
        rows.sort_by(|a, b| a.entity.cmp(&b.entity).then(a.time.cmp(&b.time)));

        let names: BTreeSet<String> =
            rows.iter().flat_map(|row| row.values.keys().cloned()).collect();
        let mut columns: BTreeMap<String, Series> =
            names.into_iter().map(|name| (name, Vec::with_capacity(rows.len()))).collect();

        let entity_labels: Vec<String> = rows.iter().map(|row| row.entity.clone()).collect();
        let times: Vec<i64> = rows.iter().map(|row| row.time).collect();
        for row in &rows {
            for (name, column) in columns.iter_mut() {
                column.push(row.values.get(name).copied().filter(|v| v.is_finite()));
            }
        }
        Self::assemble(entity_labels, times, columns)
    }

    /// Build a panel from parallel key vectors and named columns.
    ///
    /// Rows need not be sorted; they are stably sorted by `(entity, time)`
    /// and every column is permuted accordingly.
    ///
    /// Errors
    /// ------
    /// - `PanelError::LengthMismatch` if `time` or a column length differs
    ///   from `entity.len()`.
    /// - `PanelError::Empty` / `PanelError::DuplicateKey` as in
    ///   [`Panel::from_observations`].
    pub fn from_columns(
        entity: Vec<String>, time: Vec<i64>, columns: Vec<(String, Series)>,
    ) -> PanelResult<Self> {
        let n = entity.len();
        if time.len() != n {
            return Err(PanelError::LengthMismatch {
                name: "time".to_string(),
                expected: n,
                found: time.len(),
            });
        }
        for (name, values) in &columns {
            if values.len() != n {
                return Err(PanelError::LengthMismatch {
                    name: name.clone(),
                    expected: n,
                    found: values.len(),
                });
            }
        }
        if n == 0 {
            return Err(PanelError::Empty);
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| entity[a].cmp(&entity[b]).then(time[a].cmp(&time[b])));

        let entity_labels = order.iter().map(|&i| entity[i].clone()).collect();
        let times = order.iter().map(|&i| time[i]).collect();
        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                let permuted = order.iter().map(|&i| values[i].filter(|v| v.is_finite())).collect();
                (name, permuted)
            })
            .collect();
        Self::assemble(entity_labels, times, columns)
    }

    /// Number of rows (observations).
    pub fn n_rows(&self) -> usize {
        self.time_of.len()
    }

    /// Sorted unique entity identifiers.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    /// Entity index of a row.
    pub fn entity_of(&self, row: usize) -> usize {
        self.entity_of[row]
    }

    /// Period of a row.
    pub fn time_of(&self, row: usize) -> i64 {
        self.time_of[row]
    }

    /// Owned key of a row.
    pub fn key(&self, row: usize) -> PanelKey {
        PanelKey { entity: self.entities[self.entity_of[row]].clone(), time: self.time_of[row] }
    }

    /// Row range occupied by entity index `entity`.
    pub fn entity_rows(&self, entity: usize) -> Range<usize> {
        self.blocks[entity].clone()
    }

    /// Row holding `(entity, time)`, if observed.
    pub fn find_row(&self, entity: usize, time: i64) -> Option<usize> {
        let block = self.blocks.get(entity)?.clone();
        let start = block.start;
        self.time_of[block].binary_search(&time).ok().map(|offset| start + offset)
    }

    /// Sorted distinct periods across all entities.
    pub fn periods(&self) -> Vec<i64> {
        let set: BTreeSet<i64> = self.time_of.iter().copied().collect();
        set.into_iter().collect()
    }

    /// Variable names in lexicographic order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column of a variable.
    ///
    /// Errors
    /// ------
    /// - `PanelError::UnknownVariable` if `name` is not a column.
    pub fn series(&self, name: &str) -> PanelResult<&[Option<f64>]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PanelError::UnknownVariable { name: name.to_string() })
    }

    /// Mean of all defined values of a variable, or `None` if it has none.
    pub fn mean(&self, name: &str) -> PanelResult<Option<f64>> {
        Ok(defined_mean(self.series(name)?))
    }

    /// New panel with an extra (or replaced) column.
    ///
    /// Errors
    /// ------
    /// - `PanelError::LengthMismatch` if `values.len() != n_rows()`.
    pub fn with_series(&self, name: impl Into<String>, values: Series) -> PanelResult<Panel> {
        let name = name.into();
        if values.len() != self.n_rows() {
            return Err(PanelError::LengthMismatch {
                name,
                expected: self.n_rows(),
                found: values.len(),
            });
        }
        let mut out = self.clone();
        out.columns.insert(name, values.into_iter().map(|v| v.filter(|x| x.is_finite())).collect());
        Ok(out)
    }

    /// New panel keeping only entities for which `keep` returns `true`.
    ///
    /// Errors
    /// ------
    /// - `PanelError::Empty` if no rows remain.
    pub fn retain_entities<F>(&self, keep: F) -> PanelResult<Panel>
    where
        F: Fn(&str) -> bool,
    {
        self.retain_rows(|row| keep(&self.entities[self.entity_of[row]]))
    }

    /// New panel restricted to periods inside `window` (inclusive).
    ///
    /// Errors
    /// ------
    /// - `PanelError::Empty` if no rows remain.
    pub fn restrict_periods(&self, window: RangeInclusive<i64>) -> PanelResult<Panel> {
        self.retain_rows(|row| window.contains(&self.time_of[row]))
    }

    // ---- Helper methods ----

    fn retain_rows<F>(&self, keep: F) -> PanelResult<Panel>
    where
        F: Fn(usize) -> bool,
    {
        let rows: Vec<usize> = (0..self.n_rows()).filter(|&row| keep(row)).collect();
        if rows.is_empty() {
            return Err(PanelError::Empty);
        }
        let entity_labels = rows.iter().map(|&r| self.entities[self.entity_of[r]].clone()).collect();
        let times = rows.iter().map(|&r| self.time_of[r]).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), rows.iter().map(|&r| values[r]).collect()))
            .collect();
        Self::assemble(entity_labels, times, columns)
    }

    /// Index already-sorted rows into entity blocks, rejecting duplicates.
    fn assemble(
        entity_labels: Vec<String>, times: Vec<i64>, columns: BTreeMap<String, Series>,
    ) -> PanelResult<Panel> {
        let mut entities: Vec<String> = Vec::new();
        let mut entity_of = Vec::with_capacity(times.len());
        let mut blocks: Vec<Range<usize>> = Vec::new();

        for (row, label) in entity_labels.into_iter().enumerate() {
            let new_entity = entities.last().is_none_or(|last| *last != label);
            if new_entity {
                if let Some(block) = blocks.last_mut() {
                    block.end = row;
                }
                entities.push(label);
                blocks.push(row..row + 1);
            } else if times[row] == times[row - 1] {
                return Err(PanelError::DuplicateKey {
                    entity: label,
                    time: times[row],
                });
            }
            entity_of.push(entities.len() - 1);
        }
        if let Some(block) = blocks.last_mut() {
            block.end = times.len();
        }

        Ok(Panel { entities, entity_of, time_of: times, blocks, columns })
    }
}

/// Serde form of a [`Panel`]: one key per row and named columns.
#[derive(Serialize, Deserialize)]
struct PanelRecord {
    entity: Vec<String>,
    time: Vec<i64>,
    columns: BTreeMap<String, Series>,
}

impl From<Panel> for PanelRecord {
    fn from(panel: Panel) -> Self {
        let entity = panel.entity_of.iter().map(|&e| panel.entities[e].clone()).collect();
        PanelRecord { entity, time: panel.time_of, columns: panel.columns }
    }
}

impl TryFrom<PanelRecord> for Panel {
    type Error = PanelError;

    fn try_from(record: PanelRecord) -> PanelResult<Self> {
        Panel::from_columns(record.entity, record.time, record.columns.into_iter().collect())
    }
}

/// Mean over the defined entries of a series.
pub fn defined_mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) =
        values.iter().flatten().fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
