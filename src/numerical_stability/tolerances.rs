//! Tolerances and guarded helpers shared by the estimation stack.
//!
//! # Provided items
//! - [`EIGEN_EPS`]: relative eigenvalue floor for rank checks on `X̃ᵀX̃`.
//! - [`WITHIN_TOL`]: convergence bound on group means in the two-way
//!   within transform.
//! - [`DENOMINATOR_FLOOR`]: clamp value `ε = 1e-12` for the multiplier
//!   denominator.
//! - [`clamp_denominator`], [`symmetrize`].
use ndarray::Array2;

/// Relative eigenvalue floor used to declare a cross-product matrix
/// rank-deficient.
///
/// A Gram matrix `G = X̃ᵀX̃` is treated as singular when
/// `λ_min(G) ≤ EIGEN_EPS · max(λ_max(G), 1)`.
pub const EIGEN_EPS: f64 = 1e-10;

/// Maximum absolute entity/time group mean tolerated after the two-way
/// within transform.
pub const WITHIN_TOL: f64 = 1e-10;

/// Safety bound on alternating-projection sweeps in the within transform.
pub const MAX_WITHIN_ITER: usize = 10_000;

/// Generic small-number guard (variances, standard errors).
pub const GENERAL_TOL: f64 = 1e-14;

/// Lower clamp for the multiplier denominator `D_h = R_h + w·X_h`.
pub const DENOMINATOR_FLOOR: f64 = 1e-12;

/// Clamp a ratio denominator from below at [`DENOMINATOR_FLOOR`].
///
/// Returns the clamped value and whether the clamp was active. Negative and
/// near-zero denominators are both mapped to the floor, so the ratio stays
/// finite and keeps the sign of its numerator.
#[inline]
pub fn clamp_denominator(denominator: f64) -> (f64, bool) {
    if denominator >= DENOMINATOR_FLOOR {
        (denominator, false)
    } else {
        (DENOMINATOR_FLOOR, true)
    }
}

/// Replace `m` by `(m + mᵀ) / 2` in place.
///
/// # Panics
/// Panics if `m` is not square.
pub fn symmetrize(m: &mut Array2<f64>) {
    let k = m.nrows();
    assert_eq!(k, m.ncols(), "symmetrize requires a square matrix");
    for i in 0..k {
        for j in (i + 1)..k {
            let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
            m[[i, j]] = avg;
            m[[j, i]] = avg;
        }
    }
}
