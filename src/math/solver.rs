//! Square linear system solvers.
//!
//! Every estimator in this crate reduces to a small system of normal equations
//!
//! ```text
//! A w = b,   A = XᵗX (+ λI) or XᵗWX,   A is n × n
//! ```
//!
//! The estimators only need "solve this, or tell me it has no solution", so the
//! capability is a trait. A `None` from `solve` is the singular-matrix outcome;
//! callers turn it into `RegressError::Singular`.
//!
//! Two backends:
//! - `LuSolver`: LU with partial pivoting. Singular exactly when `det(A) == 0`.
//! - `SvdSolver`: rank-revealing. Treats `A` as singular when its numerical rank
//!   (relative tolerance) is below `n`, so near-singular systems are rejected too.

use clap::ValueEnum;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Solve `A w = b` for a square `A`.
pub trait LinearSolver: Send + Sync {
    /// Returns `None` when `A` has no inverse (or is not square).
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>>;

    fn name(&self) -> &'static str;
}

/// LU decomposition backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuSolver;

impl LinearSolver for LuSolver {
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
        if !a.is_square() || a.nrows() != b.len() {
            return None;
        }
        let lu = a.clone().lu();
        if lu.determinant() == 0.0 {
            return None;
        }
        lu.solve(b).filter(|w| w.iter().all(|v| v.is_finite()))
    }

    fn name(&self) -> &'static str {
        "lu"
    }
}

/// SVD backend with a relative rank tolerance.
#[derive(Debug, Clone, Copy)]
pub struct SvdSolver {
    /// Singular values below `tolerance * σ_max` count as zero.
    pub tolerance: f64,
}

impl Default for SvdSolver {
    fn default() -> Self {
        Self { tolerance: 1e-12 }
    }
}

impl LinearSolver for SvdSolver {
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
        if !a.is_square() || a.nrows() != b.len() {
            return None;
        }
        let svd = a.clone().svd(true, true);
        let sigma_max = svd.singular_values.max();
        if !(sigma_max.is_finite() && sigma_max > 0.0) {
            return None;
        }
        let eps = self.tolerance * sigma_max;
        if svd.rank(eps) < a.ncols() {
            return None;
        }
        svd.solve(b, eps)
            .ok()
            .filter(|w| w.iter().all(|v| v.is_finite()))
    }

    fn name(&self) -> &'static str {
        "svd"
    }
}

/// Solver selection for the CLI and run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Lu,
    Svd,
}

impl SolverKind {
    pub fn build(self) -> Box<dyn LinearSolver> {
        match self {
            SolverKind::Lu => Box::new(LuSolver),
            SolverKind::Svd => Box::new(SvdSolver::default()),
        }
    }
}
