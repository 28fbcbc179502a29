//! panel — immutable panel store and typed lag/lead transforms.
//!
//! Purpose
//! -------
//! Hold the `(entity, time)`-indexed observation table that every estimator
//! in this crate reads, and derive shifted series from it without mutation.
//!
//! Key behaviors
//! -------------
//! - [`Panel`]: sorted, duplicate-free observation table with
//!   subset/derive operations that return new panels.
//! - [`SeriesKey`]: typed `(base, shift kind, amount)` name of a derived
//!   series, replacing string-synthesized column names.
//! - [`SeriesResolver`]: memo cache of derived series for one panel.
//!
//! Invariants & assumptions
//! ------------------------
//! - The panel is read-only to every consumer; derived data shares its key
//!   space (row order) and is never reordered independently.
//! - Lags and leads are missing at entity boundaries and across gaps.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`data`] and [`shift`] cover construction, lookup
//!   failures, and boundary behavior; `tests/shift_properties.rs` checks the
//!   lag/lead round trip on random gapped panels.

pub mod data;
pub mod errors;
pub mod shift;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::{Observation, Panel, PanelKey, Series, defined_mean};
pub use self::errors::{PanelError, PanelResult};
pub use self::shift::{SeriesKey, SeriesResolver, ShiftKind};

pub mod prelude {
    pub use super::data::{Observation, Panel, PanelKey};
    pub use super::errors::{PanelError, PanelResult};
    pub use super::shift::{SeriesKey, SeriesResolver};
}
