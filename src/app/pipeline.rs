//! Shared "run" logic behind each subcommand.
//!
//! Every command follows the same workflow:
//! load dataset -> build solver -> run estimator(s) -> collect outputs
//!
//! The functions here return plain data; printing and exporting stay in
//! `app` / `report` so the workflow is testable without a terminal.

use nalgebra::DVector;

use crate::domain::{BandwidthScore, Dataset, ExportResult, RunConfig};
use crate::error::{AppError, RegressResult};
use crate::fit::{
    CrossValidation, CrossValidationOptions, RidgeFit, RidgePath, StagewiseFit, StagewiseOptions, fit_ols,
    fit_ridge_standardized, predict_lwlr_batch, ridge_cross_validate, ridge_path, stagewise,
};
use crate::io::load_dataset;
use crate::math::{LinearSolver, center, predict, rss};

/// Load the dataset named by the run configuration.
pub fn load(config: &RunConfig) -> Result<Dataset, AppError> {
    Ok(load_dataset(&config.data_path, config.delimiter)?)
}

#[derive(Debug, Clone)]
pub struct OlsRun {
    pub data: Dataset,
    pub weights: DVector<f64>,
    pub rss: f64,
}

pub fn run_ols(config: &RunConfig) -> Result<OlsRun, AppError> {
    let data = load(config)?;
    let solver = config.solver.build();

    let weights = fit_ols(data.features(), data.targets(), solver.as_ref())?;
    let fitted = predict(data.features(), &weights)?;
    let rss = rss(data.targets().as_slice(), fitted.as_slice())?;

    Ok(OlsRun { data, weights, rss })
}

/// Which rows to train on and which to hold out, and the bandwidths to try.
#[derive(Debug, Clone)]
pub struct LwlrPlan {
    pub bandwidths: Vec<f64>,
    /// Leading rows used for training; defaults to everything not held out.
    pub train_rows: Option<usize>,
    /// Rows right after the training rows used as a holdout.
    pub test_rows: usize,
}

#[derive(Debug, Clone)]
pub struct LwlrRun {
    pub data: Dataset,
    pub train_rows: usize,
    pub test_rows: usize,
    pub scores: Vec<BandwidthScore>,
    /// Holdout RSS of a global OLS fit on the training rows.
    pub ols_test_rss: Option<f64>,
}

pub fn run_lwlr(config: &RunConfig, plan: &LwlrPlan) -> Result<LwlrRun, AppError> {
    if plan.bandwidths.is_empty() {
        return Err(AppError::new(2, "At least one --bandwidth is required."));
    }
    let data = load(config)?;
    let solver = config.solver.build();

    let m = data.n_samples();
    let train_len = plan.train_rows.unwrap_or(m.saturating_sub(plan.test_rows));
    if train_len == 0 || train_len + plan.test_rows > m {
        return Err(AppError::new(
            2,
            format!(
                "Cannot split {m} samples into {train_len} training and {} holdout rows.",
                plan.test_rows
            ),
        ));
    }
    let train = data.rows(0..train_len)?;
    let test = if plan.test_rows > 0 {
        Some(data.rows(train_len..train_len + plan.test_rows)?)
    } else {
        None
    };

    let mut scores = Vec::with_capacity(plan.bandwidths.len());
    for &k in &plan.bandwidths {
        let (train_rss, train_singular) = lwlr_rss(&train, &train, k, solver.as_ref())?;
        let (test_rss, test_singular) = match &test {
            Some(test) => lwlr_rss(test, &train, k, solver.as_ref())?,
            None => (None, 0),
        };
        log::info!("lwlr k={k}: train rss={train_rss:?} test rss={test_rss:?}");
        scores.push(BandwidthScore {
            bandwidth: k,
            train_rss,
            test_rss,
            singular_queries: train_singular + test_singular,
        });
    }

    let ols_test_rss = match &test {
        Some(test) => match fit_ols(train.features(), train.targets(), solver.as_ref()) {
            Ok(w) => {
                let y_hat = predict(test.features(), &w)?;
                Some(rss(test.targets().as_slice(), y_hat.as_slice())?)
            }
            Err(e) if e.is_singular() => {
                log::warn!("ols baseline unavailable: {e}");
                None
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    Ok(LwlrRun {
        data,
        train_rows: train_len,
        test_rows: plan.test_rows,
        scores,
        ols_test_rss,
    })
}

/// RSS of LWLR predictions for every row of `queries`, or `None` if any query
/// was singular. Also returns the number of singular queries.
fn lwlr_rss(
    queries: &Dataset,
    train: &Dataset,
    bandwidth: f64,
    solver: &dyn LinearSolver,
) -> RegressResult<(Option<f64>, usize)> {
    let predictions = predict_lwlr_batch(queries.features(), train.features(), train.targets(), bandwidth, solver)?;
    let singular = predictions.iter().filter(|p| p.is_none()).count();
    if singular > 0 {
        return Ok((None, singular));
    }
    let y_hat: Vec<f64> = predictions.into_iter().flatten().collect();
    Ok((Some(rss(queries.targets().as_slice(), &y_hat)?), 0))
}

#[derive(Debug, Clone)]
pub enum RidgeRun {
    Single { data: Dataset, fit: RidgeFit },
    Path { data: Dataset, path: RidgePath },
}

pub fn run_ridge(config: &RunConfig, lambda: Option<f64>) -> Result<RidgeRun, AppError> {
    let data = load(config)?;
    let solver = config.solver.build();

    match lambda {
        Some(lambda) => {
            let fit = fit_ridge_standardized(&data, lambda, config.zero_variance, solver.as_ref())?;
            Ok(RidgeRun::Single { data, fit })
        }
        None => {
            let path = ridge_path(&data, config.zero_variance, solver.as_ref())?;
            Ok(RidgeRun::Path { data, path })
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagewiseRun {
    pub data: Dataset,
    pub options: StagewiseOptions,
    pub fit: StagewiseFit,
    /// OLS on the same standardized data, for comparison.
    pub ols_weights: Option<DVector<f64>>,
}

pub fn run_stagewise(config: &RunConfig, options: StagewiseOptions) -> Result<StagewiseRun, AppError> {
    let data = load(config)?;
    let solver = config.solver.build();

    let fit = stagewise(&data, &options, config.zero_variance)?;

    let centered = center(data.targets())?;
    let ols_weights = match fit_ols(&fit.scaling.matrix, &centered.values, solver.as_ref()) {
        Ok(w) => Some(w),
        Err(e) if e.is_singular() => {
            log::warn!("ols comparison unavailable: {e}");
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok(StagewiseRun {
        data,
        options,
        fit,
        ols_weights,
    })
}

#[derive(Debug, Clone)]
pub struct CrossValidationRun {
    pub data: Dataset,
    pub options: CrossValidationOptions,
    pub cv: CrossValidation,
}

pub fn run_cross_validation(
    config: &RunConfig,
    options: CrossValidationOptions,
) -> Result<CrossValidationRun, AppError> {
    let data = load(config)?;
    let solver = config.solver.build();
    let cv = ridge_cross_validate(&data, &options, config.zero_variance, solver.as_ref())?;
    Ok(CrossValidationRun { data, options, cv })
}

fn to_vec(v: &DVector<f64>) -> Vec<f64> {
    v.iter().copied().collect()
}

impl OlsRun {
    pub fn export(&self) -> ExportResult {
        ExportResult::Ols {
            weights: to_vec(&self.weights),
            rss: self.rss,
        }
    }
}

impl LwlrRun {
    pub fn export(&self) -> ExportResult {
        ExportResult::Lwlr {
            train_rows: self.train_rows,
            test_rows: self.test_rows,
            bandwidths: self.scores.clone(),
            ols_test_rss: self.ols_test_rss,
        }
    }
}

impl RidgeRun {
    pub fn data(&self) -> &Dataset {
        match self {
            RidgeRun::Single { data, .. } | RidgeRun::Path { data, .. } => data,
        }
    }

    pub fn export(&self) -> Result<ExportResult, AppError> {
        match self {
            RidgeRun::Single { fit, .. } => {
                let (raw, intercept) = fit.raw_coefficients()?;
                Ok(ExportResult::Ridge {
                    lambda: fit.lambda,
                    weights: to_vec(&fit.weights),
                    raw_weights: to_vec(&raw),
                    intercept,
                })
            }
            RidgeRun::Path { path, .. } => Ok(ExportResult::RidgePath {
                penalties: path.penalties.clone(),
                weights: path.weights.iter().map(to_vec).collect(),
            }),
        }
    }
}

impl StagewiseRun {
    pub fn export(&self) -> ExportResult {
        ExportResult::Stagewise {
            epsilon: self.options.epsilon,
            iterations: self.fit.iterations_run(),
            weights: to_vec(&self.fit.weights),
            trace: self.fit.trace.iter().map(to_vec).collect(),
            rss: self.fit.rss.clone(),
            ols_weights: self.ols_weights.as_ref().map(to_vec),
        }
    }
}

impl CrossValidationRun {
    pub fn export(&self) -> ExportResult {
        ExportResult::CrossValidation {
            rounds: self.options.rounds,
            seed: self.options.seed,
            penalties: self.cv.penalties.clone(),
            mean_errors: self.cv.mean_errors.clone(),
            best_penalty: self.cv.best_penalty(),
            raw_weights: to_vec(&self.cv.raw_weights),
            intercept: self.cv.intercept,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use crate::domain::Delimiter;
    use crate::math::{SolverKind, VariancePolicy};

    /// Write `contents` to a unique file under the system temp dir.
    fn temp_data(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("regress-{}-{name}.txt", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn config(path: PathBuf) -> RunConfig {
        RunConfig {
            data_path: path,
            delimiter: Delimiter::Tab,
            solver: SolverKind::Lu,
            zero_variance: VariancePolicy::Skip,
            export: None,
        }
    }

    fn line_file(name: &str) -> PathBuf {
        let mut text = String::new();
        for i in 0..12 {
            let x = i as f64 * 0.5;
            text.push_str(&format!("1.0\t{x}\t{}\n", 3.0 + 2.0 * x + 0.1 * (i as f64).sin()));
        }
        temp_data(name, &text)
    }

    #[test]
    fn ols_run_reports_weights_and_rss() {
        let path = line_file("ols");
        let run = run_ols(&config(path.clone())).unwrap();
        assert!((run.weights[1] - 2.0).abs() < 0.1);
        assert!(run.rss >= 0.0 && run.rss < 0.2);
        assert!(matches!(run.export(), ExportResult::Ols { .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn lwlr_run_scores_every_bandwidth() {
        let path = line_file("lwlr");
        let plan = LwlrPlan {
            bandwidths: vec![0.5, 1.0, 10.0],
            train_rows: Some(8),
            test_rows: 4,
        };
        let run = run_lwlr(&config(path.clone()), &plan).unwrap();
        assert_eq!(run.scores.len(), 3);
        assert_eq!(run.train_rows, 8);
        assert!(run.scores.iter().all(|s| s.test_rss.is_some()));
        assert!(run.ols_test_rss.is_some());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn lwlr_run_rejects_oversized_split() {
        let path = line_file("lwlr-split");
        let plan = LwlrPlan {
            bandwidths: vec![1.0],
            train_rows: Some(10),
            test_rows: 5,
        };
        let err = run_lwlr(&config(path.clone()), &plan).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn ridge_path_run_skips_constant_intercept_column() {
        let path = line_file("ridge");
        match run_ridge(&config(path.clone()), None).unwrap() {
            RidgeRun::Path { path: p, .. } => assert_eq!(p.len(), 30),
            other => panic!("expected path, got {other:?}"),
        }
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = run_ols(&config(PathBuf::from("/nonexistent/regress.txt"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
