//! inference — Driscoll–Kraay covariance for two-way fixed-effects fits.
//!
//! Purpose
//! -------
//! Provide post-estimation uncertainty quantification for the panel
//! regressions run at every projection horizon. Standard errors are robust
//! to heteroskedasticity, serial correlation up to a bandwidth, and
//! arbitrary cross-sectional correlation within a period.
//!
//! Key behaviors
//! -------------
//! - Define a unified error and result type, [`InferenceError`] and
//!   [`InferenceResult`], for conformability failures.
//! - Enumerate HAC kernel families with [`KernelType`] and default-bandwidth
//!   rules with [`BandwidthRule`].
//! - Configure the estimator via [`DriscollKraayOptions`] (kernel, bandwidth
//!   override or rule, small-sample correction).
//! - Build the sandwich `(X̃ᵀX̃)⁻¹ S (X̃ᵀX̃)⁻¹` with [`driscoll_kraay`],
//!   reporting the effective bandwidth and its source.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are within-transformed regressors and residuals together with a
//!   dense chronological period index.
//! - The effective bandwidth never exceeds `T − 1`.
//!
//! Conventions
//! -----------
//! - All functions are pure: no logging and no global state. Failures are
//!   reported via [`InferenceResult`] only.
//!
//! Downstream usage
//! ----------------
//! - `estimation::two_way` produces `X̃`, `ε̃`, the period index, and
//!   `(X̃ᵀX̃)⁻¹`; `projection` passes them to [`driscoll_kraay`] once per
//!   horizon.

pub mod driscoll_kraay;
pub mod errors;
pub mod kernel;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::driscoll_kraay::{
    BandwidthSource, DriscollKraayCovariance, DriscollKraayOptions, driscoll_kraay,
    long_run_variance, period_moments,
};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::kernel::{BandwidthRule, KernelType};

// ---- Optional convenience prelude for downstream crates ------------------

pub mod prelude {
    pub use super::driscoll_kraay::{DriscollKraayCovariance, DriscollKraayOptions, driscoll_kraay};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::kernel::{BandwidthRule, KernelType};
}
