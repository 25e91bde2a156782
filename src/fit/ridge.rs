//! Ridge regression and the regularization path.
//!
//! ```text
//! w(λ) = (XᵗX + λI)⁻¹ Xᵗy
//! ```
//!
//! `X` is expected to be standardized and `y` centered (see `math::scale`), so no
//! intercept is penalized. The path sweeps the fixed geometric grid
//! `λ_i = e^(i - 10)`, `i = 0..30`, which shows coefficients shrinking toward
//! zero as the penalty grows.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::Dataset;
use crate::error::{RegressError, RegressResult};
use crate::fit::check_training;
use crate::math::{LinearSolver, Standardized, VariancePolicy, center, standardize};

/// Number of penalties in the regularization path.
pub const RIDGE_PATH_STEPS: usize = 30;

/// `λ_0 = e^(-RIDGE_PATH_OFFSET)`.
const RIDGE_PATH_OFFSET: f64 = 10.0;

/// The path penalties `e^(i - 10)` for `i = 0..30`, ascending.
pub fn ridge_penalties() -> Vec<f64> {
    (0..RIDGE_PATH_STEPS)
        .map(|i| (i as f64 - RIDGE_PATH_OFFSET).exp())
        .collect()
}

/// Fit ridge weights for one penalty.
pub fn fit_ridge(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    lambda: f64,
    solver: &dyn LinearSolver,
) -> RegressResult<DVector<f64>> {
    check_training(x, y)?;
    if !(lambda.is_finite() && lambda >= 0.0) {
        return Err(RegressError::invalid(
            "lambda",
            format!("{lambda} (must be finite and >= 0)"),
        ));
    }

    let xt = x.transpose();
    let mut denom = &xt * x;
    for i in 0..denom.nrows() {
        denom[(i, i)] += lambda;
    }
    let xty = &xt * y;

    solver
        .solve(&denom, &xty)
        .ok_or(RegressError::Singular { stage: "ridge" })
}

/// A single-penalty fit on standardized data, with what is needed to map it back.
#[derive(Debug, Clone)]
pub struct RidgeFit {
    pub lambda: f64,
    /// Weights in standardized feature units.
    pub weights: DVector<f64>,
    pub scaling: Standardized,
    pub target_mean: f64,
}

impl RidgeFit {
    /// `(coefficients, intercept)` in raw feature units.
    pub fn raw_coefficients(&self) -> RegressResult<(DVector<f64>, f64)> {
        self.scaling.to_raw_coefficients(&self.weights, self.target_mean)
    }
}

/// Standardize `data`, center its targets and fit one penalty.
pub fn fit_ridge_standardized(
    data: &Dataset,
    lambda: f64,
    policy: VariancePolicy,
    solver: &dyn LinearSolver,
) -> RegressResult<RidgeFit> {
    let scaling = standardize(data.features(), policy)?;
    let centered = center(data.targets())?;
    let weights = fit_ridge(&scaling.matrix, &centered.values, lambda, solver)?;
    Ok(RidgeFit {
        lambda,
        weights,
        scaling,
        target_mean: centered.mean,
    })
}

/// Weight vectors along a penalty sweep.
#[derive(Debug, Clone)]
pub struct RidgePath {
    pub penalties: Vec<f64>,
    /// `weights[i]` was fitted with `penalties[i]`.
    pub weights: Vec<DVector<f64>>,
    pub scaling: Standardized,
    pub target_mean: f64,
}

impl RidgePath {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Euclidean norm of every weight vector, in path order.
    pub fn norms(&self) -> Vec<f64> {
        self.weights.iter().map(|w| w.norm()).collect()
    }
}

/// The fixed 30-penalty regularization path.
pub fn ridge_path(data: &Dataset, policy: VariancePolicy, solver: &dyn LinearSolver) -> RegressResult<RidgePath> {
    ridge_path_with(data, &ridge_penalties(), policy, solver)
}

/// Regularization path over caller-chosen penalties.
///
/// Every point is an independent fit; they are computed in parallel and kept
/// in `penalties` order.
pub fn ridge_path_with(
    data: &Dataset,
    penalties: &[f64],
    policy: VariancePolicy,
    solver: &dyn LinearSolver,
) -> RegressResult<RidgePath> {
    if penalties.is_empty() {
        return Err(RegressError::invalid("penalties", "at least one penalty is required"));
    }

    let scaling = standardize(data.features(), policy)?;
    let centered = center(data.targets())?;

    let weights = penalties
        .par_iter()
        .map(|&lambda| fit_ridge(&scaling.matrix, &centered.values, lambda, solver))
        .collect::<RegressResult<Vec<_>>>()?;

    log::debug!(
        "ridge path: {} penalties over {} samples x {} features",
        penalties.len(),
        data.n_samples(),
        data.n_features()
    );

    Ok(RidgePath {
        penalties: penalties.to_vec(),
        weights,
        scaling,
        target_mean: centered.mean,
    })
}
