//! Ridge penalty selection by repeated random holdout.
//!
//! Each round shuffles the sample order (seeded, so runs are reproducible),
//! trains the full regularization path on the first `train_fraction` of the
//! samples and scores every penalty on the rest:
//!
//! ```text
//! ŷ_test = standardize_train(X_test) · w(λ) + mean(y_train)
//! ```
//!
//! The penalty with the lowest mean holdout RSS wins. Its model is refitted on
//! the whole dataset and reported in raw feature units with a constant term.

use nalgebra::DVector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::Dataset;
use crate::error::{RegressError, RegressResult};
use crate::fit::ridge::{fit_ridge_standardized, ridge_path};
use crate::math::{LinearSolver, VariancePolicy, rss};

#[derive(Debug, Clone, Copy)]
pub struct CrossValidationOptions {
    pub rounds: usize,
    /// Share of samples used for training in each round.
    pub train_fraction: f64,
    pub seed: u64,
}

impl Default for CrossValidationOptions {
    fn default() -> Self {
        Self {
            rounds: 10,
            train_fraction: 0.9,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrossValidation {
    pub penalties: Vec<f64>,
    /// `errors[round][i]`: holdout RSS of `penalties[i]` in that round.
    pub errors: Vec<Vec<f64>>,
    pub mean_errors: Vec<f64>,
    pub best_index: usize,
    /// Best model refitted on all samples, raw feature units.
    pub raw_weights: DVector<f64>,
    pub intercept: f64,
}

impl CrossValidation {
    pub fn best_penalty(&self) -> f64 {
        self.penalties[self.best_index]
    }
}

pub fn ridge_cross_validate(
    data: &Dataset,
    opts: &CrossValidationOptions,
    policy: VariancePolicy,
    solver: &dyn LinearSolver,
) -> RegressResult<CrossValidation> {
    if opts.rounds == 0 {
        return Err(RegressError::invalid("rounds", "must be >= 1"));
    }
    if !(opts.train_fraction.is_finite() && opts.train_fraction > 0.0 && opts.train_fraction < 1.0) {
        return Err(RegressError::invalid(
            "train fraction",
            format!("{} (must be in (0, 1))", opts.train_fraction),
        ));
    }

    let m = data.n_samples();
    let cutoff = m as f64 * opts.train_fraction;
    let train_len = (0..m).filter(|&j| (j as f64) < cutoff).count();
    if train_len == 0 || train_len >= m {
        return Err(RegressError::invalid(
            "train fraction",
            format!("{m} samples leave no training or no holdout rows at fraction {}", opts.train_fraction),
        ));
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut indices: Vec<usize> = (0..m).collect();
    let mut errors = Vec::with_capacity(opts.rounds);
    let mut penalties = Vec::new();

    for round in 0..opts.rounds {
        indices.shuffle(&mut rng);
        let train = data.select(&indices[..train_len])?;
        let test = data.select(&indices[train_len..])?;

        let path = ridge_path(&train, policy, solver)?;
        let test_x = path.scaling.apply(test.features())?;

        let round_errors = path
            .weights
            .iter()
            .map(|w| {
                let y_est = (&test_x * w).add_scalar(path.target_mean);
                rss(test.targets().as_slice(), y_est.as_slice())
            })
            .collect::<RegressResult<Vec<f64>>>()?;

        log::debug!("cv round {round}: train={train_len} test={}", m - train_len);
        penalties = path.penalties;
        errors.push(round_errors);
    }

    let k = penalties.len();
    let mean_errors: Vec<f64> = (0..k)
        .map(|i| errors.iter().map(|row| row[i]).sum::<f64>() / errors.len() as f64)
        .collect();

    let mut best_index = 0;
    for (i, &err) in mean_errors.iter().enumerate() {
        if err < mean_errors[best_index] {
            best_index = i;
        }
    }

    let best = fit_ridge_standardized(data, penalties[best_index], policy, solver)?;
    let (raw_weights, intercept) = best.raw_coefficients()?;
    log::info!(
        "cv: best penalty {:.6e} (index {best_index}) with mean holdout rss {:.6}",
        penalties[best_index],
        mean_errors[best_index]
    );

    Ok(CrossValidation {
        penalties,
        errors,
        mean_errors,
        best_index,
        raw_weights,
        intercept,
    })
}
