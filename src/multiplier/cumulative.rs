//! multiplier::cumulative — running sums of response paths and band SEs.
//!
//! Purpose
//! -------
//! Turn a per-horizon response path into a cumulative-effect path and
//! recover standard errors from (possibly asymmetric) bands.
//!
//! Key behaviors
//! -------------
//! - [`cumulative`] scales the point path and both band paths by `scale`,
//!   then takes inclusive running sums over ascending `h`, each path on its
//!   own. Applied to a response whose dependent variable is already
//!   cumulative (`y_{t+h} − y_{t−1}`) this accumulates a second time; that
//!   compounding is kept as is.
//! - [`se_from_bands`] computes `0.5·((hi − mid) + (mid − lo))`.
//!
//! Conventions
//! -----------
//! - Summing band paths is not the band of the summed path; downstream
//!   standard errors are read back from these summed bands by
//!   [`se_from_bands`].
use crate::{
    multiplier::errors::{MultiplierError, MultiplierResult},
    projection::irf::BandPath,
};

/// Scaled, inclusive running sum of a response path and its bands.
///
/// Returns a [`BandPath`] with the same horizons where
/// `mean[h] = scale · Σ_{i≤h} mean_in[i]` and likewise for `low` and
/// `high`.
pub fn cumulative(path: &BandPath, scale: f64) -> BandPath {
    let running = |values: &[f64]| -> Vec<f64> {
        values
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v * scale;
                Some(*acc)
            })
            .collect()
    };
    BandPath {
        horizons: path.horizons.clone(),
        mean: running(&path.mean),
        low: running(&path.low),
        high: running(&path.high),
    }
}

/// Standard errors implied by one-SE bands, averaging both half-widths.
///
/// Errors
/// ------
/// - `MultiplierError::LengthMismatch` if the three slices differ in length.
pub fn se_from_bands(mid: &[f64], lo: &[f64], hi: &[f64]) -> MultiplierResult<Vec<f64>> {
    for (what, found) in [("lower band", lo.len()), ("upper band", hi.len())] {
        if found != mid.len() {
            return Err(MultiplierError::LengthMismatch { what, expected: mid.len(), found });
        }
    }
    Ok(mid
        .iter()
        .zip(lo)
        .zip(hi)
        .map(|((m, l), h)| 0.5 * ((h - m) + (m - l)))
        .collect())
}
