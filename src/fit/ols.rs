//! Ordinary least squares.
//!
//! ```text
//! w = (XᵗX)⁻¹ Xᵗy
//! ```
//!
//! An intercept is modeled by including a constant feature column in `X`.

use nalgebra::{DMatrix, DVector};

use crate::error::{RegressError, RegressResult};
use crate::fit::check_training;
use crate::math::LinearSolver;

/// Fit OLS weights.
///
/// Returns `RegressError::Singular` when `XᵗX` has no inverse, e.g. with
/// collinear columns or fewer samples than features.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>, solver: &dyn LinearSolver) -> RegressResult<DVector<f64>> {
    check_training(x, y)?;

    let xt = x.transpose();
    let xtx = &xt * x;
    let xty = &xt * y;

    let w = solver
        .solve(&xtx, &xty)
        .ok_or(RegressError::Singular { stage: "ols" })?;
    log::debug!("ols: solved {}x{} normal equations with {}", xtx.nrows(), xtx.ncols(), solver.name());
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::testdata::{TRUE_INTERCEPT, TRUE_WEIGHTS, linear_dataset, with_intercept};
    use crate::math::{LuSolver, SvdSolver};

    /// A solver that never finds an inverse.
    struct AlwaysSingular;

    impl LinearSolver for AlwaysSingular {
        fn solve(&self, _a: &DMatrix<f64>, _b: &DVector<f64>) -> Option<DVector<f64>> {
            None
        }

        fn name(&self) -> &'static str {
            "always-singular"
        }
    }

    #[test]
    fn recovers_exact_line() {
        // Intercept column + one feature, y = 2x.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 4.0, 6.0]);

        let w = fit_ols(&x, &y, &LuSolver).unwrap();
        assert!(w[0].abs() < 1e-6, "intercept should be ~0, got {}", w[0]);
        assert!((w[1] - 2.0).abs() < 1e-6, "slope should be ~2, got {}", w[1]);
    }

    #[test]
    fn recovers_noiseless_weights_with_both_backends() {
        let data = linear_dataset();
        let x = with_intercept(data.features());

        let svd = SvdSolver::default();
        let solvers: [&dyn LinearSolver; 2] = [&LuSolver, &svd];
        for solver in solvers {
            let w = fit_ols(&x, data.targets(), solver).unwrap();
            assert!((w[0] - TRUE_INTERCEPT).abs() < 1e-8);
            for (got, want) in w.iter().skip(1).zip(TRUE_WEIGHTS.iter()) {
                assert!((got - want).abs() < 1e-8, "{} vs {want}", solver.name());
            }
        }
    }

    #[test]
    fn collinear_columns_are_singular() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let err = fit_ols(&x, &y, &LuSolver).unwrap_err();
        assert!(err.is_singular());
    }

    #[test]
    fn solver_failure_is_reported_as_singular() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 4.0, 6.0]);
        let err = fit_ols(&x, &y, &AlwaysSingular).unwrap_err();
        assert!(matches!(err, RegressError::Singular { stage: "ols" }));
    }

    #[test]
    fn target_length_must_match_rows() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            fit_ols(&x, &y, &LuSolver),
            Err(RegressError::DimensionMismatch { .. })
        ));
    }
}
