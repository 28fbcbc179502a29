//! panel::errors — error type for panel construction and series lookup.
//!
//! Purpose
//! -------
//! Report malformed panels (duplicate keys, ragged columns) and unresolvable
//! variable names. An unknown variable is the crate's "missing
//! configuration" failure: it is raised as soon as a name is looked up and is
//! never downgraded to a missing value.
//!
//! Conventions
//! -----------
//! - Variants carry the offending name or key so messages are actionable
//!   without access to the panel itself.
//! - [`PanelResult<T>`] is used by every fallible routine in `panel`.
use thiserror::Error;

pub type PanelResult<T> = Result<T, PanelError>;

/// PanelError — failures raised by the panel store and shift transforms.
///
/// Variants
/// --------
/// - `UnknownVariable { name }`
///   A variable name could not be resolved against the panel's columns.
/// - `DuplicateKey { entity, time }`
///   Two observations share the same `(entity, time)` key.
/// - `LengthMismatch { name, expected, found }`
///   A column does not have one value per panel row.
/// - `Empty`
///   The panel has no rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("Unknown variable `{name}`: not present in the panel.")]
    UnknownVariable { name: String },

    #[error("Duplicate observation for entity `{entity}` at period {time}.")]
    DuplicateKey { entity: String, time: i64 },

    #[error("Column `{name}` has {found} values, expected {expected} (one per panel row).")]
    LengthMismatch { name: String, expected: usize, found: usize },

    #[error("Panel contains no observations.")]
    Empty,
}
