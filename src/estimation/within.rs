//! estimation::within — two-way (entity and period) within transform.
//!
//! Purpose
//! -------
//! Remove entity and period fixed effects from a column by projecting it on
//! the orthogonal complement of the entity and period dummies. Regressing
//! demeaned `y` on demeaned `X` then reproduces the slope coefficients of
//! the full dummy-variable regression.
//!
//! Key behaviors
//! -------------
//! - A first pass applies the textbook double demeaning
//!   `v − v̄_i − v̄_t + v̄`, which is already the exact projection on a
//!   balanced panel.
//! - On unbalanced panels the first pass is refined by alternating entity
//!   and period projections (method of alternating projections) until every
//!   entity mean and every period mean is below tolerance.
//!
//! Invariants & assumptions
//! ------------------------
//! - Group indices are dense: `entity[r] < n_entities`,
//!   `period[r] < n_periods`.
//! - After [`TwoWayDemeaner::demean`] the values of every entity group and
//!   every period group sum to zero within tolerance.
//!
//! Conventions
//! -----------
//! - Convergence is judged on the largest absolute group mean relative to
//!   `max|v|`, against [`WITHIN_TOL`], so the result does not depend on the
//!   units of `v`. Hitting
//!   [`MAX_WITHIN_ITER`] sweeps is logged and the last iterate is returned.
use crate::numerical_stability::{MAX_WITHIN_ITER, WITHIN_TOL};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::warn;

/// TwoWayDemeaner — precomputed group structure for the within transform.
#[derive(Debug, Clone)]
pub struct TwoWayDemeaner {
    entity: Vec<usize>,
    period: Vec<usize>,
    entity_counts: Vec<f64>,
    period_counts: Vec<f64>,
}

impl TwoWayDemeaner {
    /// Build from per-row dense group indices.
    ///
    /// # Panics
    /// Panics if the index vectors differ in length or an index is out of
    /// range for its group count; both are programmer errors upstream.
    pub fn new(entity: &[usize], period: &[usize], n_entities: usize, n_periods: usize) -> Self {
        assert_eq!(entity.len(), period.len(), "entity and period index lengths differ");
        let mut entity_counts = vec![0.0; n_entities];
        let mut period_counts = vec![0.0; n_periods];
        for (&e, &t) in entity.iter().zip(period) {
            entity_counts[e] += 1.0;
            period_counts[t] += 1.0;
        }
        TwoWayDemeaner {
            entity: entity.to_vec(),
            period: period.to_vec(),
            entity_counts,
            period_counts,
        }
    }

    pub fn n_obs(&self) -> usize {
        self.entity.len()
    }

    /// Two-way demeaned copy of `v`.
    pub fn demean(&self, v: ArrayView1<'_, f64>) -> Array1<f64> {
        let n = self.n_obs();
        if n == 0 {
            return Array1::zeros(0);
        }
        let entity_means = group_means(v, &self.entity, &self.entity_counts);
        let period_means = group_means(v, &self.period, &self.period_counts);
        let grand = v.sum() / n as f64;
        let mut out = Array1::from_shape_fn(n, |r| {
            v[r] - entity_means[self.entity[r]] - period_means[self.period[r]] + grand
        });

        let scale = v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
        let tol = WITHIN_TOL * scale;
        for _ in 0..MAX_WITHIN_ITER {
            if self.max_group_mean_abs(out.view()) <= tol {
                return out;
            }
            sweep(&mut out, &self.entity, &self.entity_counts);
            sweep(&mut out, &self.period, &self.period_counts);
        }
        if self.max_group_mean_abs(out.view()) > tol {
            warn!(sweeps = MAX_WITHIN_ITER, "two-way within transform did not converge");
        }
        out
    }

    /// Column-wise [`TwoWayDemeaner::demean`].
    pub fn demean_columns(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros(x.raw_dim());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            out.column_mut(j).assign(&self.demean(column));
        }
        out
    }

    /// Largest absolute entity or period mean of `v`.
    pub fn max_group_mean_abs(&self, v: ArrayView1<'_, f64>) -> f64 {
        let entity = group_means(v, &self.entity, &self.entity_counts);
        let period = group_means(v, &self.period, &self.period_counts);
        entity.iter().chain(period.iter()).fold(0.0_f64, |acc, m| acc.max(m.abs()))
    }
}

// ---- Helper methods ----

fn group_means(v: ArrayView1<'_, f64>, group: &[usize], counts: &[f64]) -> Vec<f64> {
    let mut sums = vec![0.0; counts.len()];
    for (&g, &x) in group.iter().zip(v.iter()) {
        sums[g] += x;
    }
    sums.iter().zip(counts).map(|(s, &c)| if c > 0.0 { s / c } else { 0.0 }).collect()
}

/// One projection step: subtract group means in place.
fn sweep(v: &mut Array1<f64>, group: &[usize], counts: &[f64]) {
    let means = group_means(v.view(), group, counts);
    for (x, &g) in v.iter_mut().zip(group) {
        *x -= means[g];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exactness of the one-pass transform on balanced panels.
    // - Zero group sums on unbalanced panels after refinement.
    // - Annihilation of pure entity + period effects.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // On a balanced 2×3 panel the result equals the textbook double
    // demeaning.
    fn balanced_panel_matches_double_demeaning() {
        // Arrange
        let entity = [0, 0, 0, 1, 1, 1];
        let period = [0, 1, 2, 0, 1, 2];
        let v = array![1.0, 4.0, 2.0, 3.0, 0.0, 8.0];
        let demeaner = TwoWayDemeaner::new(&entity, &period, 2, 3);

        // Act
        let out = demeaner.demean(v.view());

        // Assert
        let e_mean = [7.0 / 3.0, 11.0 / 3.0];
        let t_mean = [2.0, 2.0, 5.0];
        let grand = 3.0;
        for r in 0..6 {
            let expected = v[r] - e_mean[entity[r]] - t_mean[period[r]] + grand;
            assert_relative_eq!(out[r], expected, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Unbalanced panels still end with zero entity and period sums.
    //
    // Given
    // -----
    // - Entity 0 observes periods 0..3, entity 1 periods 1..3, entity 2
    //   periods 0 and 2.
    //
    // Expect
    // ------
    // - Every group mean is below 1e-9.
    fn unbalanced_panel_has_zero_group_sums() {
        // Arrange
        let entity = [0, 0, 0, 1, 1, 2, 2];
        let period = [0, 1, 2, 1, 2, 0, 2];
        let v = array![10.0, 20.0, 30.0, 25.0, 35.0, -4.0, 7.5];
        let demeaner = TwoWayDemeaner::new(&entity, &period, 3, 3);

        // Act
        let out = demeaner.demean(v.view());

        // Assert
        assert!(demeaner.max_group_mean_abs(out.view()) < 1e-9);
    }

    #[test]
    fn additive_fixed_effects_are_removed_completely() {
        let entity = [0, 0, 1, 1, 1, 2];
        let period = [0, 1, 0, 1, 2, 2];
        let alpha = [1.0, -3.0, 7.0];
        let gamma = [0.5, 2.0, -1.0];
        let v = Array1::from_shape_fn(6, |r| alpha[entity[r]] + gamma[period[r]]);
        let demeaner = TwoWayDemeaner::new(&entity, &period, 3, 3);

        let out = demeaner.demean(v.view());

        for x in out.iter() {
            assert!(x.abs() < 1e-8, "residual fixed effect {x}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Convergence is relative to the magnitude of the column, so a column
    // in tiny units is demeaned as precisely as the same column in units of 1.
    fn tiny_columns_converge_to_the_same_relative_precision() {
        let entity = [0, 0, 0, 1, 1, 2, 2];
        let period = [0, 1, 2, 1, 2, 0, 2];
        let v = array![10.0, 20.0, 30.0, 25.0, 35.0, -4.0, 7.5];
        let demeaner = TwoWayDemeaner::new(&entity, &period, 3, 3);

        let unit = demeaner.demean(v.view());
        let tiny = demeaner.demean((&v * 1e-9).view());

        for r in 0..v.len() {
            assert_relative_eq!(tiny[r] * 1e9, unit[r], epsilon = 1e-7);
        }
        assert!(demeaner.max_group_mean_abs(tiny.view()) < 2.0 * WITHIN_TOL * 35.0e-9);
    }

    #[test]
    fn all_zero_column_returns_zeros() {
        let demeaner = TwoWayDemeaner::new(&[0, 1, 1], &[0, 0, 1], 2, 2);
        let out = demeaner.demean(Array1::<f64>::zeros(3).view());
        assert!(out.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn demean_columns_transforms_each_column_independently() {
        let entity = [0, 0, 1, 1];
        let period = [0, 1, 0, 1];
        let x = array![[1.0, 5.0], [2.0, 1.0], [4.0, 0.0], [3.0, 2.0]];
        let demeaner = TwoWayDemeaner::new(&entity, &period, 2, 2);

        let out = demeaner.demean_columns(&x);

        assert_eq!(out.column(1), demeaner.demean(x.column(1)));
        assert_relative_eq!(out.column(0).sum(), 0.0, epsilon = 1e-12);
    }
}
