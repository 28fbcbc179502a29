//! diagnostics — specification tests around panel local projections.
//!
//! Purpose
//! -------
//! Provide the statistics used to judge a local-projection specification
//! and the re-estimation sweeps that check its robustness. All of them call
//! the same projection primitive with a modified configuration; only the
//! test statistics themselves are new code.
//!
//! Key behaviors
//! -------------
//! - [`joint_wald`] / [`interaction_wald`]: `Σ (θ/se)²` against `χ²(m)`.
//! - [`pesaran_cd`]: pairwise-complete cross-sectional dependence.
//! - [`ips_test`]: averaged ADF(1) t-statistics with fixed moments.
//! - [`placebo_test`]: the baseline with `F1.shock` as the shock.
//! - [`exogeneity_test`]: shock on lagged macro controls.
//! - [`r2_comparison`]: within-R² with and without the interaction.
//! - [`interaction_robustness`], [`multiplier_robustness`],
//!   [`conditional_responses`]: alternative configurations and moderator
//!   quantiles.
//! - [`BatteryConfig::run`]: all of the above in one call.
//!
//! Invariants & assumptions
//! ------------------------
//! - Degenerate inputs never abort a battery; they become
//!   [`DiagnosticOutcome::Skipped`] with a reason.
//! - Unknown variables and invalid configurations are returned as errors.

pub mod battery;
pub mod errors;
pub mod exogeneity;
pub mod outcome;
pub mod pesaran;
pub mod placebo;
pub mod r2;
pub mod robustness;
pub mod unit_root;
pub mod wald;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::battery::{BatteryConfig, BatteryReport};
pub use self::errors::{DiagnosticError, DiagnosticResult};
pub use self::exogeneity::{ExogeneityConfig, ExogeneityTest, exogeneity_test};
pub use self::outcome::{DiagnosticOutcome, SkipRecord};
pub use self::pesaran::{PesaranCd, ResidualKind, pesaran_cd, pesaran_cd_by_horizon};
pub use self::placebo::{PlaceboTest, placebo_test, placebo_test_at};
pub use self::r2::{R2Row, r2_comparison};
pub use self::robustness::{
    DEFAULT_QUANTILE_PAIRS, QuantileResponses, Variant, conditional_responses,
    interaction_robustness, multiplier_robustness, quantile,
};
pub use self::unit_root::{IpsTest, ips_test};
pub use self::wald::{WaldTest, interaction_wald, joint_wald};

pub mod prelude {
    pub use super::battery::{BatteryConfig, BatteryReport};
    pub use super::errors::{DiagnosticError, DiagnosticResult};
    pub use super::outcome::{DiagnosticOutcome, SkipRecord};
    pub use super::robustness::Variant;
}
