//! projection — horizon-by-horizon panel local projections.
//!
//! Purpose
//! -------
//! Orchestrate the estimation primitive over horizons `0..=H` for one
//! [`LpConfig`] and expose the resulting impulse response as an [`Irf`].
//!
//! Key behaviors
//! -------------
//! - [`LpConfig`] is the single configuration record reused by the
//!   multiplier pipeline, the diagnostic battery, and robustness sweeps.
//! - [`LocalProjection::estimate`] validates the configuration, then runs
//!   design → two-way FE → Driscoll–Kraay per horizon.
//! - [`HorizonResult`] carries coefficients, covariance, keyed residuals and
//!   fit statistics; [`BandPath`] is the path view used downstream.
//!
//! Invariants & assumptions
//! ------------------------
//! - Horizons are estimated independently; a failed horizon never affects
//!   another.
//! - p-values use the standard normal reference.

pub mod config;
pub mod errors;
pub mod horizon;
pub mod irf;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::config::{DependentForm, LpConfig, Moderator};
pub use self::errors::{ConfigError, ProjectionError, ProjectionResult};
pub use self::horizon::{
    CoefficientEstimate, HorizonFailure, HorizonOutcome, HorizonResult, KeyedResidual,
    normal_two_sided_p,
};
pub use self::irf::{BandPath, Irf, LocalProjection};

pub mod prelude {
    pub use super::config::{DependentForm, LpConfig, Moderator};
    pub use super::errors::{ProjectionError, ProjectionResult};
    pub use super::horizon::{CoefficientEstimate, HorizonResult};
    pub use super::irf::{BandPath, Irf, LocalProjection};
}
