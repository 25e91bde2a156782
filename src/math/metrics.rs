//! Error metrics and linear predictions.

use nalgebra::{DMatrix, DVector};

use crate::error::{RegressError, RegressResult};

/// Residual sum of squares `Σ (y_i - ŷ_i)^2`.
pub fn rss(actual: &[f64], predicted: &[f64]) -> RegressResult<f64> {
    if actual.len() != predicted.len() {
        return Err(RegressError::DimensionMismatch {
            context: "rss",
            expected: actual.len(),
            actual: predicted.len(),
        });
    }
    Ok(actual
        .iter()
        .zip(predicted)
        .map(|(y, y_hat)| (y - y_hat) * (y - y_hat))
        .sum())
}

/// Linear predictions `X w`.
pub fn predict(x: &DMatrix<f64>, w: &DVector<f64>) -> RegressResult<DVector<f64>> {
    if x.ncols() != w.len() {
        return Err(RegressError::DimensionMismatch {
            context: "predict",
            expected: x.ncols(),
            actual: w.len(),
        });
    }
    Ok(x * w)
}
