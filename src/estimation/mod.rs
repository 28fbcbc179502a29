//! estimation — design assembly and two-way fixed-effects least squares.
//!
//! Purpose
//! -------
//! Provide the single estimation primitive that every projection horizon
//! and every diagnostic re-run goes through: build a listwise-complete
//! design from typed series keys, remove entity and period effects, and
//! solve for the slope coefficients.
//!
//! Key behaviors
//! -------------
//! - [`build_design`] resolves a [`DesignSpec`] against a panel through a
//!   shared [`SeriesResolver`](crate::panel::SeriesResolver) memo.
//! - [`TwoWayDemeaner`] implements the two-way within transform.
//! - [`fit_two_way`] solves the demeaned normal equations and returns a
//!   [`TwoWayFit`] with everything the covariance layer needs.
//!
//! Conventions
//! -----------
//! - Identification failures are [`EstimationError::InsufficientData`] and
//!   are local to one regression.

pub mod design;
pub mod errors;
pub mod two_way;
pub mod within;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::design::{Dependent, DesignMatrix, DesignSpec, Regressor, build_design};
pub use self::errors::{EstimationError, EstimationResult};
pub use self::two_way::{TwoWayFit, fit_two_way};
pub use self::within::TwoWayDemeaner;

pub mod prelude {
    pub use super::design::{Dependent, DesignSpec, Regressor, build_design};
    pub use super::errors::{EstimationError, EstimationResult};
    pub use super::two_way::{TwoWayFit, fit_two_way};
}
