//! Estimators.
//!
//! Each estimator is a pure function over an immutable training set:
//!
//! - `ols`: ordinary least squares
//! - `lwlr`: locally weighted linear regression (single query and batch)
//! - `ridge`: ridge regression and the fixed regularization path
//! - `stagewise`: greedy forward stage-wise selection
//! - `cv`: ridge penalty selection by repeated holdout

pub mod cv;
pub mod lwlr;
pub mod ols;
pub mod ridge;
pub mod stagewise;

pub use cv::*;
pub use lwlr::*;
pub use ols::*;
pub use ridge::*;
pub use stagewise::*;

use nalgebra::{DMatrix, DVector};

use crate::error::{RegressError, RegressResult};

/// Validate a `(X, y)` training pair: non-empty and one target per row.
pub(crate) fn check_training(x: &DMatrix<f64>, y: &DVector<f64>) -> RegressResult<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(RegressError::EmptyDataset);
    }
    if y.len() != x.nrows() {
        return Err(RegressError::DimensionMismatch {
            context: "training targets",
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    Ok(())
}
