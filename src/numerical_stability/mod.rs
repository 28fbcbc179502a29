//! numerical_stability — shared tolerances and guarded scalar helpers.
//!
//! Purpose
//! -------
//! Centralize the small numerical constants used across the estimation,
//! inference, multiplier, and diagnostics layers so that rank checks,
//! convergence criteria, and denominator clamping agree everywhere.
//!
//! Key behaviors
//! -------------
//! - Expose the tolerances ([`EIGEN_EPS`], [`WITHIN_TOL`], [`GENERAL_TOL`],
//!   [`DENOMINATOR_FLOOR`]) as `pub const` items.
//! - Provide [`clamp_denominator`] for ratio estimands whose denominator
//!   may approach zero, and [`symmetrize`] for covariance matrices that
//!   accumulate rounding asymmetry.
//!
//! Conventions
//! -----------
//! - This module never logs, performs I/O, or touches global state.
//! - All helpers assume finite `f64` inputs; validation happens upstream.

pub mod tolerances;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::tolerances::{
    DENOMINATOR_FLOOR, EIGEN_EPS, GENERAL_TOL, MAX_WITHIN_ITER, WITHIN_TOL, clamp_denominator,
    symmetrize,
};
