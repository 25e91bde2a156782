//! Command-line parsing for the regression toolkit.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::Delimiter;
use crate::math::{SolverKind, VariancePolicy};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "regress",
    version,
    about = "Linear regression toolkit: OLS, locally weighted, ridge, and stage-wise fits"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ordinary least squares on the whole dataset.
    Ols(OlsArgs),
    /// Locally weighted linear regression, scored per bandwidth.
    Lwlr(LwlrArgs),
    /// Ridge regression: one penalty, or the 30-point path when `--lambda` is omitted.
    Ridge(RidgeArgs),
    /// Forward stage-wise regression on standardized data.
    Stagewise(StagewiseArgs),
    /// Pick a ridge penalty by repeated random holdout.
    Cv(CvArgs),
    /// Print a previously exported result JSON.
    Show(ShowArgs),
}

/// Input and backend options shared by every fitting command.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Data file: feature columns followed by the target column, no header.
    #[arg(short = 'd', long, value_name = "FILE", env = "REGRESS_DATA")]
    pub data: PathBuf,

    /// Column delimiter.
    #[arg(long, value_enum, default_value_t = Delimiter::Tab, env = "REGRESS_DELIMITER")]
    pub delimiter: Delimiter,

    /// Linear solver backend.
    #[arg(long, value_enum, default_value_t = SolverKind::Lu, env = "REGRESS_SOLVER")]
    pub solver: SolverKind,

    /// How to standardize a constant feature column.
    #[arg(long, value_enum, default_value_t = VariancePolicy::Fail, env = "REGRESS_ZERO_VARIANCE")]
    pub zero_variance: VariancePolicy,

    /// Write the result as JSON to this path.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct OlsArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

#[derive(Debug, Args, Clone)]
pub struct LwlrArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Kernel bandwidth(s) k; repeat or comma-separate to compare several.
    #[arg(
        short = 'k',
        long = "bandwidth",
        value_delimiter = ',',
        num_args = 1..,
        default_values_t = [0.1, 1.0, 10.0]
    )]
    pub bandwidths: Vec<f64>,

    /// Leading rows to train on (default: every row not held out).
    #[arg(long)]
    pub train_rows: Option<usize>,

    /// Rows right after the training rows to score as a holdout.
    #[arg(long, default_value_t = 0)]
    pub test_rows: usize,
}

#[derive(Debug, Args, Clone)]
pub struct RidgeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Single penalty to fit. Omit to compute the full path.
    #[arg(long)]
    pub lambda: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct StagewiseArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Step size per iteration.
    #[arg(long, default_value_t = 0.01)]
    pub epsilon: f64,

    /// Number of iterations.
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,

    /// Stop at the first iteration where no step lowers the RSS.
    #[arg(long)]
    pub early_stop: bool,

    /// Print the weight vector after every iteration.
    #[arg(long)]
    pub trace: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CvArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Number of shuffled train/holdout rounds.
    #[arg(long, default_value_t = 10)]
    pub rounds: usize,

    /// Share of samples used for training in each round.
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// Shuffle seed.
    #[arg(long, default_value_t = 42, env = "REGRESS_SEED")]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Result JSON written by `--export`.
    #[arg(value_name = "JSON")]
    pub file: PathBuf,
}
