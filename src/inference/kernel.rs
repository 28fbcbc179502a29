//! inference::kernel — lag windows and default bandwidths.
//!
//! Purpose
//! -------
//! Weight the lag-`k` autocovariances of the period moment series when the
//! Driscoll–Kraay meat matrix is assembled, and choose a bandwidth `L` when
//! none is configured.
//!
//! Conventions
//! -----------
//! - Windows are evaluated at `x = k/(L+1)`, so the last included lag
//!   `k = L` still receives positive weight.
//! - Bandwidths count time periods, not panel rows.
//! - The rule that produced a bandwidth is reported with the covariance.
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Lag window applied to period autocovariances.
///
/// `Bartlett` is the default for Driscoll–Kraay errors. `IID` keeps only the
/// contemporaneous term; `Parzen` and `QuadraticSpectral` are smoother
/// alternatives, the latter without compact support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelType {
    IID,
    Bartlett,
    Parzen,
    QuadraticSpectral,
}

impl KernelType {
    /// Window value `w(x)`; symmetric in `x`.
    pub fn weight(&self, x: f64) -> f64 {
        let a = x.abs();
        match self {
            KernelType::IID if a == 0.0 => 1.0,
            KernelType::IID => 0.0,
            KernelType::Bartlett => (1.0 - a).max(0.0),
            KernelType::Parzen if a <= 0.5 => 1.0 - 6.0 * a * a * (1.0 - a),
            KernelType::Parzen if a <= 1.0 => 2.0 * (1.0 - a).powi(3),
            KernelType::Parzen => 0.0,
            KernelType::QuadraticSpectral if a == 0.0 => 1.0,
            KernelType::QuadraticSpectral => {
                let z = 6.0 * PI * a / 5.0;
                3.0 / (z * z) * (z.sin() / z - z.cos())
            }
        }
    }

    /// Weight of the lag-`lag` autocovariance under bandwidth `bandwidth`.
    #[inline]
    pub fn lag_weight(&self, lag: usize, bandwidth: usize) -> f64 {
        self.weight(lag as f64 / (bandwidth + 1) as f64)
    }
}

/// Default-bandwidth rule used when no explicit bandwidth is configured.
///
/// - `FourthRoot`: `L = ⌊T^{1/4}⌋`.
/// - `NeweyWest`: `L = ⌊4 (T/100)^{2/9}⌋`, the Newey–West (1994) rule of
///   thumb used by the common panel packages for Driscoll–Kraay errors
///   (crate default).
///
/// In both cases `T` is the number of distinct time periods in the
/// estimation sample; callers truncate the result to `T − 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BandwidthRule {
    FourthRoot,
    #[default]
    NeweyWest,
}

impl BandwidthRule {
    /// Bandwidth implied by the rule for `n_periods` time periods.
    ///
    /// A `1e-9` nudge is added before flooring so exact powers
    /// (`T = 16 → 2`) are not lost to rounding in `powf`.
    pub fn bandwidth(&self, n_periods: usize) -> usize {
        let t = n_periods as f64;
        let raw = match self {
            BandwidthRule::FourthRoot => t.powf(0.25),
            BandwidthRule::NeweyWest => 4.0 * (t / 100.0).powf(2.0 / 9.0),
        };
        (raw + 1e-9).floor() as usize
    }
}
