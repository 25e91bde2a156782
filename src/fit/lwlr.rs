//! Locally weighted linear regression (LWLR).
//!
//! For a query point `q` each training sample `j` gets a Gaussian kernel weight
//!
//! ```text
//! W_jj = exp(-‖q - x_j‖² / (2k²))
//! ```
//!
//! and we solve the weighted normal equations `(XᵗWX) w = XᵗWy`, predicting
//! `qᵗw`. Nothing is shared between queries: every prediction builds its own
//! kernel and its own system.
//!
//! `W` is diagonal, so it is kept as a length-`m` vector and applied by scaling
//! the rows of `X`.
//!
//! The bandwidth `k` trades locality for stability: small `k` fits local
//! structure but risks a singular system (far from every sample all kernel
//! weights underflow to zero), large `k` tends to the global OLS fit.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::error::{RegressError, RegressResult};
use crate::fit::check_training;
use crate::math::LinearSolver;

/// Diagonal of the kernel weight matrix for `query`.
pub fn kernel_weights(query: &[f64], x: &DMatrix<f64>, bandwidth: f64) -> DVector<f64> {
    let denom = -2.0 * bandwidth * bandwidth;
    DVector::from_iterator(
        x.nrows(),
        x.row_iter().map(|row| {
            let dist_sq: f64 = row
                .iter()
                .zip(query)
                .map(|(xj, qj)| (qj - xj) * (qj - xj))
                .sum();
            (dist_sq / denom).exp()
        }),
    )
}

/// Predict the target at a single query point.
pub fn predict_lwlr(
    query: &[f64],
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    bandwidth: f64,
    solver: &dyn LinearSolver,
) -> RegressResult<f64> {
    check_training(x, y)?;
    check_bandwidth(bandwidth)?;
    if query.len() != x.ncols() {
        return Err(RegressError::DimensionMismatch {
            context: "lwlr query",
            expected: x.ncols(),
            actual: query.len(),
        });
    }
    predict_point(query, x, y, bandwidth, solver)
}

/// Predict every row of `queries`, in order.
///
/// Rows are independent; a singular system yields `None` for that row only.
/// Shape or bandwidth problems fail the whole batch up front.
pub fn predict_lwlr_batch(
    queries: &DMatrix<f64>,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    bandwidth: f64,
    solver: &dyn LinearSolver,
) -> RegressResult<Vec<Option<f64>>> {
    check_training(x, y)?;
    check_bandwidth(bandwidth)?;
    if queries.ncols() != x.ncols() {
        return Err(RegressError::DimensionMismatch {
            context: "lwlr queries",
            expected: x.ncols(),
            actual: queries.ncols(),
        });
    }

    let predictions: Vec<Option<f64>> = (0..queries.nrows())
        .into_par_iter()
        .map(|i| {
            let query: Vec<f64> = queries.row(i).iter().copied().collect();
            match predict_point(&query, x, y, bandwidth, solver) {
                Ok(v) => Some(v),
                Err(e) => {
                    log::warn!("lwlr query {i} (k={bandwidth}): {e}");
                    None
                }
            }
        })
        .collect();

    let singular = predictions.iter().filter(|p| p.is_none()).count();
    log::debug!(
        "lwlr batch: {} queries, k={bandwidth}, {singular} singular",
        predictions.len()
    );
    Ok(predictions)
}

fn predict_point(
    query: &[f64],
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    bandwidth: f64,
    solver: &dyn LinearSolver,
) -> RegressResult<f64> {
    let weights = kernel_weights(query, x, bandwidth);

    // WX: row j of X scaled by W_jj.
    let mut wx = x.clone();
    for (j, mut row) in wx.row_iter_mut().enumerate() {
        row *= weights[j];
    }

    let xtwx = x.transpose() * &wx;
    let xtwy = wx.transpose() * y;

    let beta = solver
        .solve(&xtwx, &xtwy)
        .ok_or(RegressError::Singular { stage: "lwlr" })?;

    Ok(query.iter().zip(beta.iter()).map(|(q, b)| q * b).sum())
}

fn check_bandwidth(bandwidth: f64) -> RegressResult<()> {
    if !(bandwidth.is_finite() && bandwidth > 0.0) {
        return Err(RegressError::invalid(
            "bandwidth",
            format!("{bandwidth} (must be finite and > 0)"),
        ));
    }
    Ok(())
}
