//! Column standardization and target centering.
//!
//! The shrinkage estimators (ridge, stage-wise) work on
//!
//! ```text
//! x'_ij = (x_ij - mean_j) / var_j        y'_i = y_i - mean(y)
//! ```
//!
//! Note the divisor is the column *variance* (population, ddof = 0), not the
//! standard deviation. The statistics are kept so that held-out rows can be
//! standardized with training values and fitted weights mapped back to raw units.

use clap::ValueEnum;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{RegressError, RegressResult};

/// What to do with a feature column whose variance is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VariancePolicy {
    /// Report `RegressError::DegenerateVariance`.
    #[default]
    Fail,
    /// Center the column but leave it unscaled (scale 1).
    Skip,
}

/// A standardized feature matrix plus the statistics used to produce it.
#[derive(Debug, Clone)]
pub struct Standardized {
    pub matrix: DMatrix<f64>,
    pub means: DVector<f64>,
    /// Per-column divisor: the variance, or `1.0` for skipped columns.
    pub scales: DVector<f64>,
    /// Columns left unscaled under `VariancePolicy::Skip`.
    pub skipped: Vec<usize>,
}

/// A mean-centered target vector.
#[derive(Debug, Clone)]
pub struct Centered {
    pub values: DVector<f64>,
    pub mean: f64,
}

/// Standardize every column of `x`.
pub fn standardize(x: &DMatrix<f64>, policy: VariancePolicy) -> RegressResult<Standardized> {
    let (m, n) = x.shape();
    if m == 0 || n == 0 {
        return Err(RegressError::EmptyDataset);
    }

    let mut means = DVector::<f64>::zeros(n);
    let mut scales = DVector::<f64>::zeros(n);
    let mut skipped = Vec::new();

    for (j, col) in x.column_iter().enumerate() {
        let mean = col.mean();
        let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / m as f64;

        means[j] = mean;
        if is_constant(col.iter().copied()) || !(var.is_finite() && var > 0.0) {
            match policy {
                VariancePolicy::Fail => return Err(RegressError::DegenerateVariance { column: j }),
                VariancePolicy::Skip => {
                    log::warn!("feature column {j} has zero variance; centering without scaling");
                    scales[j] = 1.0;
                    skipped.push(j);
                }
            }
        } else {
            scales[j] = var;
        }
    }

    let mut matrix = x.clone();
    for (j, mut col) in matrix.column_iter_mut().enumerate() {
        col.apply(|v| *v = (*v - means[j]) / scales[j]);
    }

    Ok(Standardized {
        matrix,
        means,
        scales,
        skipped,
    })
}

impl Standardized {
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Standardize new rows using these (training) statistics.
    pub fn apply(&self, x: &DMatrix<f64>) -> RegressResult<DMatrix<f64>> {
        if x.ncols() != self.n_features() {
            return Err(RegressError::DimensionMismatch {
                context: "standardize rows",
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        let mut out = x.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            col.apply(|v| *v = (*v - self.means[j]) / self.scales[j]);
        }
        Ok(out)
    }

    /// Express standardized-space weights in raw feature units.
    ///
    /// Returns `(coefficients, intercept)` such that
    /// `x · coefficients + intercept == standardized(x) · w + target_mean`.
    pub fn to_raw_coefficients(&self, w: &DVector<f64>, target_mean: f64) -> RegressResult<(DVector<f64>, f64)> {
        if w.len() != self.n_features() {
            return Err(RegressError::DimensionMismatch {
                context: "raw coefficients",
                expected: self.n_features(),
                actual: w.len(),
            });
        }
        let raw = w.component_div(&self.scales);
        let intercept = target_mean - self.means.dot(&raw);
        Ok((raw, intercept))
    }
}

/// Subtract the mean from `y`.
pub fn center(y: &DVector<f64>) -> RegressResult<Centered> {
    if y.is_empty() {
        return Err(RegressError::EmptyDataset);
    }
    let mean = y.mean();
    Ok(Centered {
        values: y.map(|v| v - mean),
        mean,
    })
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    let Some(first) = values.next() else {
        return true;
    };
    values.all(|v| v == first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_centered_and_divided_by_variance() {
        // Column 0: [1, 2, 3] -> mean 2, var 2/3.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 60.0]);
        let s = standardize(&x, VariancePolicy::Fail).unwrap();

        assert!((s.means[0] - 2.0).abs() < 1e-12);
        assert!((s.scales[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.matrix[(0, 0)] + 1.5).abs() < 1e-12);
        assert!((s.matrix[(2, 0)] - 1.5).abs() < 1e-12);

        for col in s.matrix.column_iter() {
            assert!(col.mean().abs() < 1e-12);
        }
    }

    #[test]
    fn zero_variance_fails_by_default() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let err = standardize(&x, VariancePolicy::Fail).unwrap_err();
        assert!(matches!(err, RegressError::DegenerateVariance { column: 0 }));
    }

    #[test]
    fn zero_variance_skip_leaves_column_unscaled() {
        let x = DMatrix::from_row_slice(3, 2, &[0.1, 1.0, 0.1, 2.0, 0.1, 3.0]);
        let s = standardize(&x, VariancePolicy::Skip).unwrap();
        assert_eq!(s.skipped, vec![0]);
        assert_eq!(s.scales[0], 1.0);
        assert!(s.matrix.iter().all(|v| v.is_finite()));
        assert!(s.matrix.column(0).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn apply_reuses_training_statistics() {
        let train = DMatrix::from_row_slice(2, 1, &[0.0, 2.0]);
        let s = standardize(&train, VariancePolicy::Fail).unwrap();
        let test = DMatrix::from_row_slice(1, 1, &[3.0]);
        let out = s.apply(&test).unwrap();
        // mean 1, var 1
        assert!((out[(0, 0)] - 2.0).abs() < 1e-12);

        let wide = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(s.apply(&wide).is_err());
    }

    #[test]
    fn raw_coefficients_reproduce_standardized_predictions() {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 5.0, 2.0, 3.0, 4.0, 8.0, 7.0, 1.0]);
        let s = standardize(&x, VariancePolicy::Fail).unwrap();
        let w = DVector::from_row_slice(&[0.7, -1.3]);
        let target_mean = 2.5;
        let (raw, intercept) = s.to_raw_coefficients(&w, target_mean).unwrap();

        let via_std = &s.matrix * &w;
        let via_raw = &x * &raw;
        for i in 0..4 {
            assert!((via_std[i] + target_mean - (via_raw[i] + intercept)).abs() < 1e-10);
        }
    }

    #[test]
    fn center_subtracts_mean() {
        let y = DVector::from_row_slice(&[1.0, 2.0, 6.0]);
        let c = center(&y).unwrap();
        assert!((c.mean - 3.0).abs() < 1e-12);
        assert!(c.values.sum().abs() < 1e-12);
    }
}
