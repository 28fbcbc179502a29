//! panel_lp — panel local projections with two-way fixed effects.
//!
//! Purpose
//! -------
//! Estimate state-dependent impulse responses on an (entity, period) panel:
//! one two-way fixed-effects regression per horizon, Driscoll–Kraay standard
//! errors, cumulative paths, delta-method ratio multipliers, and a battery
//! of specification diagnostics.
//!
//! Key behaviors
//! -------------
//! - [`panel`]: immutable panel store, typed lag/lead/difference keys and a
//!   memo of derived series.
//! - [`estimation`]: design matrices, the two-way within transform, and the
//!   fixed-effects least-squares solver.
//! - [`inference`]: kernels and the Driscoll–Kraay sandwich covariance.
//! - [`projection`]: configuration, the horizon loop, and IRF containers.
//! - [`multiplier`]: cumulative paths and the ratio multiplier.
//! - [`diagnostics`]: Wald, Pesaran CD, IPS-style unit root, placebo,
//!   exogeneity, R² comparison and robustness sweeps.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every entry point takes an immutable [`Panel`](panel::Panel) and
//!   returns new values; nothing is printed or written.
//! - Horizons are independent regressions; a horizon that is not identified
//!   is recorded in the result and the others are still estimated.
//!
//! Conventions
//! -----------
//! - Errors are one `thiserror` enum per subsystem, composed with `?`.
//! - Diagnostic events use `tracing`; the crate never installs a subscriber.
//! - Configuration and results implement `serde::Serialize` and
//!   `serde::Deserialize`.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use panel_lp::prelude::*;
//!
//! # fn run(panel: &Panel) -> Result<(), DiagnosticError> {
//! let cfg = LpConfig::new("log_gdp", "forecast_error")
//!     .with_moderator(Moderator::new("ge_est"))
//!     .with_controls(["gov_debt", "output_gap"])
//!     .with_horizons(4);
//! let irf = LocalProjection::new(cfg.clone()).estimate(panel)?;
//! let path = irf.shock_path()?;
//! let report = BatteryConfig::new(cfg).run(panel)?;
//! # let _ = (path, report);
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod estimation;
pub mod inference;
pub mod multiplier;
pub mod numerical_stability;
pub mod panel;
pub mod projection;

/// Types needed for a typical estimation and diagnostics run.
pub mod prelude {
    pub use crate::diagnostics::prelude::*;
    pub use crate::multiplier::prelude::*;
    pub use crate::panel::prelude::*;
    pub use crate::projection::prelude::*;
}
