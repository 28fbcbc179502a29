//! multiplier — cumulative effects and ratio multipliers.
//!
//! Purpose
//! -------
//! Turn impulse-response paths into cumulative effects and combine an
//! outcome response with a ratio response into a multiplier whose
//! uncertainty is propagated by the delta method.
//!
//! Key behaviors
//! -------------
//! - [`cumulative`] and [`se_from_bands`] operate on [`BandPath`](crate::projection::BandPath)s.
//! - [`multiplier`] builds a [`MultiplierTable`] with one-SE bands and
//!   per-row clamp flags.
//! - [`MultiplierSpec`] runs the outcome and ratio projections end to end.
//!
//! Conventions
//! -----------
//! - The denominator floor is
//!   [`DENOMINATOR_FLOOR`](crate::numerical_stability::DENOMINATOR_FLOOR).

pub mod cumulative;
pub mod errors;
pub mod pipeline;
pub mod ratio;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::cumulative::{cumulative, se_from_bands};
pub use self::errors::{MultiplierError, MultiplierResult};
pub use self::pipeline::{MultiplierEstimate, MultiplierSpec, mean_share};
pub use self::ratio::{MultiplierRow, MultiplierTable, multiplier, multiplier_gradient};

pub mod prelude {
    pub use super::cumulative::cumulative;
    pub use super::errors::{MultiplierError, MultiplierResult};
    pub use super::pipeline::{MultiplierSpec, mean_share};
    pub use super::ratio::{MultiplierTable, multiplier};
}
