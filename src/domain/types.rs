//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - passed by reference into the estimators
//! - built from CLI flags
//! - exported to JSON

use std::ops::Range;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{RegressError, RegressResult};
use crate::math::{SolverKind, VariancePolicy};

/// A training set: `m` samples of `n` features plus one target each.
///
/// Invariants (checked on construction): `m >= 1`, `n >= 1`, one target per
/// row, every value finite. A dataset is never modified in place; the row
/// helpers return new datasets.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: DMatrix<f64>,
    targets: DVector<f64>,
}

impl Dataset {
    pub fn new(features: DMatrix<f64>, targets: DVector<f64>) -> RegressResult<Self> {
        if features.nrows() == 0 || features.ncols() == 0 {
            return Err(RegressError::EmptyDataset);
        }
        if targets.len() != features.nrows() {
            return Err(RegressError::DimensionMismatch {
                context: "dataset targets",
                expected: features.nrows(),
                actual: targets.len(),
            });
        }
        if features.iter().chain(targets.iter()).any(|v| !v.is_finite()) {
            return Err(RegressError::invalid("dataset", "values must be finite"));
        }
        Ok(Self { features, targets })
    }

    /// Build from row-major feature rows and a parallel target list.
    pub fn from_rows(rows: &[Vec<f64>], targets: Vec<f64>) -> RegressResult<Self> {
        let Some(first) = rows.first() else {
            return Err(RegressError::EmptyDataset);
        };
        let n = first.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(RegressError::DimensionMismatch {
                context: "dataset rows",
                expected: n,
                actual: bad.len(),
            });
        }
        let features = DMatrix::from_row_iterator(rows.len(), n, rows.iter().flatten().copied());
        Self::new(features, DVector::from_vec(targets))
    }

    pub fn features(&self) -> &DMatrix<f64> {
        &self.features
    }

    pub fn targets(&self) -> &DVector<f64> {
        &self.targets
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Rows `range.start..range.end` as a new dataset.
    pub fn rows(&self, range: Range<usize>) -> RegressResult<Dataset> {
        if range.start >= range.end || range.end > self.n_samples() {
            return Err(RegressError::invalid(
                "row range",
                format!(
                    "{}..{} is empty or exceeds the {} available samples",
                    range.start,
                    range.end,
                    self.n_samples()
                ),
            ));
        }
        let len = range.end - range.start;
        Dataset::new(
            self.features.rows(range.start, len).into_owned(),
            self.targets.rows(range.start, len).into_owned(),
        )
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> RegressResult<Dataset> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_samples()) {
            return Err(RegressError::invalid(
                "row index",
                format!("{bad} is out of range for {} samples", self.n_samples()),
            ));
        }
        Dataset::new(
            self.features.select_rows(indices.iter()),
            self.targets.select_rows(indices.iter()),
        )
    }
}

/// Column delimiter of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Tab,
    Comma,
    /// Any run of spaces and/or tabs.
    Whitespace,
}

/// Settings shared by every subcommand.
///
/// This is derived from CLI flags (plus `REGRESS_*` environment defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub delimiter: Delimiter,
    pub solver: SolverKind,
    pub zero_variance: VariancePolicy,
    pub export: Option<PathBuf>,
}

/// A saved result file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub data: String,
    pub n_samples: usize,
    pub n_features: usize,
    pub solver: SolverKind,
    pub result: ExportResult,
}

/// Command-specific payload of an `ExportFile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ExportResult {
    Ols {
        weights: Vec<f64>,
        rss: f64,
    },
    Lwlr {
        train_rows: usize,
        test_rows: usize,
        bandwidths: Vec<BandwidthScore>,
        ols_test_rss: Option<f64>,
    },
    Ridge {
        lambda: f64,
        weights: Vec<f64>,
        raw_weights: Vec<f64>,
        intercept: f64,
    },
    RidgePath {
        penalties: Vec<f64>,
        weights: Vec<Vec<f64>>,
    },
    Stagewise {
        epsilon: f64,
        iterations: usize,
        weights: Vec<f64>,
        trace: Vec<Vec<f64>>,
        rss: Vec<f64>,
        /// OLS on the same standardized data, when it was solvable.
        #[serde(default)]
        ols_weights: Option<Vec<f64>>,
    },
    CrossValidation {
        rounds: usize,
        seed: u64,
        penalties: Vec<f64>,
        mean_errors: Vec<f64>,
        best_penalty: f64,
        raw_weights: Vec<f64>,
        intercept: f64,
    },
}

/// LWLR error summary for one bandwidth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandwidthScore {
    pub bandwidth: f64,
    /// RSS when predicting the training rows themselves.
    pub train_rss: Option<f64>,
    /// RSS on the holdout rows, when a holdout was requested.
    pub test_rss: Option<f64>,
    /// Queries whose weighted normal equations were singular.
    pub singular_queries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Dataset {
        Dataset::from_rows(
            &[vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0], vec![1.0, 4.0]],
            vec![2.0, 4.0, 6.0, 8.0],
        )
        .unwrap()
    }

    #[test]
    fn from_rows_builds_row_major_matrix() {
        let d = toy();
        assert_eq!(d.n_samples(), 4);
        assert_eq!(d.n_features(), 2);
        assert_eq!(d.features()[(2, 1)], 3.0);
        assert_eq!(d.targets()[3], 8.0);
    }

    #[test]
    fn empty_or_ragged_rows_are_rejected() {
        assert!(matches!(
            Dataset::from_rows(&[], vec![]),
            Err(RegressError::EmptyDataset)
        ));
        assert!(Dataset::from_rows(&[vec![1.0], vec![1.0, 2.0]], vec![1.0, 2.0]).is_err());
        assert!(Dataset::from_rows(&[vec![1.0], vec![2.0]], vec![1.0]).is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(Dataset::from_rows(&[vec![f64::NAN]], vec![1.0]).is_err());
    }

    #[test]
    fn row_helpers_return_new_datasets() {
        let d = toy();
        let head = d.rows(0..2).unwrap();
        assert_eq!(head.n_samples(), 2);
        assert_eq!(head.targets()[1], 4.0);

        let picked = d.select(&[3, 0]).unwrap();
        assert_eq!(picked.targets().as_slice(), &[8.0, 2.0]);
        assert_eq!(picked.features()[(0, 1)], 4.0);

        assert!(d.rows(3..9).is_err());
        assert!(d.rows(2..2).is_err());
        assert!(d.select(&[4]).is_err());
        assert_eq!(d.n_samples(), 4);
    }
}
