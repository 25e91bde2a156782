//! Forward stage-wise regression.
//!
//! A greedy cousin of the lasso: starting from `w = 0` on standardized features
//! and centered targets, every iteration tries nudging each single weight by
//! `±ε` and keeps the one nudge that lowers the training RSS the most.
//!
//! Candidates are enumerated feature-ascending, `-ε` before `+ε`; on equal RSS
//! the first one wins. A nudge is applied only when it actually improves RSS,
//! so the recorded RSS never increases. When nothing improves the weights are
//! held (or the run stops, with `early_stop`).

use nalgebra::DVector;

use crate::domain::Dataset;
use crate::error::{RegressError, RegressResult};
use crate::math::{Standardized, VariancePolicy, center, rss, standardize};

#[derive(Debug, Clone, Copy)]
pub struct StagewiseOptions {
    /// Step size `ε`.
    pub epsilon: f64,
    /// Iteration count `numIt`.
    pub iterations: usize,
    /// Stop at the first iteration with no improving nudge.
    pub early_stop: bool,
}

impl Default for StagewiseOptions {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            iterations: 100,
            early_stop: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagewiseFit {
    /// Final weights, in standardized feature units.
    pub weights: DVector<f64>,
    /// Weights after each iteration.
    pub trace: Vec<DVector<f64>>,
    /// Training RSS after each iteration.
    pub rss: Vec<f64>,
    pub stopped_early: bool,
    pub scaling: Standardized,
    pub target_mean: f64,
}

impl StagewiseFit {
    pub fn iterations_run(&self) -> usize {
        self.trace.len()
    }
}

pub fn stagewise(data: &Dataset, opts: &StagewiseOptions, policy: VariancePolicy) -> RegressResult<StagewiseFit> {
    if !(opts.epsilon.is_finite() && opts.epsilon > 0.0) {
        return Err(RegressError::invalid(
            "epsilon",
            format!("{} (must be finite and > 0)", opts.epsilon),
        ));
    }
    if opts.iterations == 0 {
        return Err(RegressError::invalid("iterations", "must be >= 1"));
    }

    let scaling = standardize(data.features(), policy)?;
    let centered = center(data.targets())?;
    let x = &scaling.matrix;
    let y = centered.values.as_slice();
    let (m, n) = x.shape();

    let mut weights = DVector::<f64>::zeros(n);
    // Running X·w, updated one column at a time.
    let mut fitted = DVector::<f64>::zeros(m);
    let mut current = rss(y, fitted.as_slice())?;

    // `iterations` is only an upper bound with `early_stop`.
    let reserve = opts.iterations.min(1024);
    let mut trace = Vec::with_capacity(reserve);
    let mut rss_trace = Vec::with_capacity(reserve);
    let mut stopped_early = false;

    for it in 0..opts.iterations {
        let mut lowest = f64::INFINITY;
        let mut best: Option<(usize, f64)> = None;

        for j in 0..n {
            for sign in [-1.0, 1.0] {
                let delta = sign * opts.epsilon;
                let candidate = &fitted + x.column(j) * delta;
                let err = rss(y, candidate.as_slice())?;
                if err < lowest {
                    lowest = err;
                    best = Some((j, delta));
                }
            }
        }

        match best {
            Some((j, delta)) if lowest < current => {
                weights[j] += delta;
                fitted += x.column(j) * delta;
                current = lowest;
            }
            _ if opts.early_stop => {
                log::debug!("stagewise: no improving step at iteration {it}, stopping");
                stopped_early = true;
                break;
            }
            _ => {}
        }

        log::trace!("stagewise iteration {it}: rss={current:.6} w={:?}", weights.as_slice());
        trace.push(weights.clone());
        rss_trace.push(current);
    }

    Ok(StagewiseFit {
        weights,
        trace,
        rss: rss_trace,
        stopped_early,
        scaling,
        target_mean: centered.mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::fit_ols;
    use crate::fit::testdata::noisy_dataset;
    use crate::math::LuSolver;

    /// Two orthogonal features, y = 3·x1 - 2·x2 + 1 exactly.
    ///
    /// Standardized, the optimum is w = [3·var(x1), -2·var(x2)] = [15.75, -2].
    fn orthogonal_dataset() -> Dataset {
        let x1 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let x2 = [1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0];
        let rows: Vec<Vec<f64>> = x1.iter().zip(x2.iter()).map(|(&a, &b)| vec![a, b]).collect();
        let y = x1.iter().zip(x2.iter()).map(|(a, b)| 3.0 * a - 2.0 * b + 1.0).collect();
        Dataset::from_rows(&rows, y).unwrap()
    }

    #[test]
    fn runs_every_iteration_and_never_increases_rss() {
        let data = noisy_dataset();
        let opts = StagewiseOptions {
            epsilon: 0.05,
            iterations: 400,
            early_stop: false,
        };
        let fit = stagewise(&data, &opts, VariancePolicy::Fail).unwrap();

        assert_eq!(fit.iterations_run(), 400);
        assert_eq!(fit.rss.len(), 400);
        assert!(!fit.stopped_early);
        for pair in fit.rss.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(fit.trace.last().unwrap(), &fit.weights);
    }

    #[test]
    fn first_step_moves_one_weight_by_epsilon() {
        let data = orthogonal_dataset();
        let opts = StagewiseOptions {
            epsilon: 0.01,
            iterations: 1,
            early_stop: false,
        };
        let fit = stagewise(&data, &opts, VariancePolicy::Fail).unwrap();
        let moved: Vec<f64> = fit.weights.iter().copied().filter(|w| *w != 0.0).collect();
        assert_eq!(moved.len(), 1);
        assert!((moved[0].abs() - 0.01).abs() < 1e-15);
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        // Two identical columns: (0, +ε) and (1, +ε) give the same RSS.
        let rows = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let data = Dataset::from_rows(&rows, vec![1.0, 2.0, 3.0]).unwrap();
        let opts = StagewiseOptions {
            epsilon: 0.1,
            iterations: 1,
            early_stop: false,
        };
        let fit = stagewise(&data, &opts, VariancePolicy::Fail).unwrap();
        assert!((fit.weights[0] - 0.1).abs() < 1e-15);
        assert_eq!(fit.weights[1], 0.0);
    }

    #[test]
    fn converges_to_least_squares_direction() {
        let data = orthogonal_dataset();
        let opts = StagewiseOptions {
            epsilon: 0.01,
            iterations: 2500,
            early_stop: false,
        };
        let fit = stagewise(&data, &opts, VariancePolicy::Fail).unwrap();

        let ols = fit_ols(&fit.scaling.matrix, &center(data.targets()).unwrap().values, &LuSolver).unwrap();
        assert!((ols[0] - 15.75).abs() < 1e-9);
        assert!((ols[1] + 2.0).abs() < 1e-9);
        for (s, o) in fit.weights.iter().zip(ols.iter()) {
            assert!((s - o).abs() <= 0.01, "stagewise {s} vs ols {o}");
        }
    }

    #[test]
    fn early_stop_ends_once_no_step_improves() {
        let data = orthogonal_dataset();
        let opts = StagewiseOptions {
            epsilon: 0.01,
            iterations: 10_000,
            early_stop: true,
        };
        let fit = stagewise(&data, &opts, VariancePolicy::Fail).unwrap();
        assert!(fit.stopped_early);
        assert!(fit.iterations_run() < 10_000);
        assert_eq!(fit.trace.len(), fit.rss.len());
    }

    #[test]
    fn huge_iteration_limit_with_early_stop_does_not_preallocate() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0]];
        let data = Dataset::from_rows(&rows, vec![1.0, 2.0, 3.0]).unwrap();
        let opts = StagewiseOptions {
            epsilon: 0.1,
            iterations: usize::MAX,
            early_stop: true,
        };
        let fit = stagewise(&data, &opts, VariancePolicy::Fail).unwrap();
        assert!(fit.stopped_early);
        // Optimum is w = 2/3; steps of 0.1 settle at 0.7.
        assert!((fit.weights[0] - 0.7).abs() < 1e-9);
        assert_eq!(fit.iterations_run(), 7);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let data = orthogonal_dataset();
        let bad_eps = StagewiseOptions {
            epsilon: -1.0,
            ..StagewiseOptions::default()
        };
        assert!(stagewise(&data, &bad_eps, VariancePolicy::Fail).is_err());

        let no_iters = StagewiseOptions {
            iterations: 0,
            ..StagewiseOptions::default()
        };
        assert!(stagewise(&data, &no_iters, VariancePolicy::Fail).is_err());
    }
}
