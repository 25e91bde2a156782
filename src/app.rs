//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` defaults and parses CLI arguments
//! - sets up logging
//! - runs the requested estimator
//! - prints the report and writes optional exports

use clap::Parser;

use crate::cli::{Command, CvArgs, DataArgs, LwlrArgs, RidgeArgs, ShowArgs, StagewiseArgs};
use crate::domain::{Dataset, ExportResult, RunConfig};
use crate::error::AppError;
use crate::fit::{CrossValidationOptions, StagewiseOptions};
use crate::report::ReportOptions;

pub mod pipeline;

/// Entry point for the `regress` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` only fills in `REGRESS_*` defaults; a missing file is fine.
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Ols(args) => {
            let config = run_config_from_args(&args.data);
            let run = pipeline::run_ols(&config)?;
            finish(&config, &run.data, run.export(), ReportOptions::default())
        }
        Command::Lwlr(args) => handle_lwlr(args),
        Command::Ridge(args) => handle_ridge(args),
        Command::Stagewise(args) => handle_stagewise(args),
        Command::Cv(args) => handle_cv(args),
        Command::Show(args) => handle_show(args),
    }
}

/// `-v` raises the default level; `RUST_LOG` still wins when set.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn handle_lwlr(args: LwlrArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data);
    let plan = pipeline::LwlrPlan {
        bandwidths: args.bandwidths,
        train_rows: args.train_rows,
        test_rows: args.test_rows,
    };
    let run = pipeline::run_lwlr(&config, &plan)?;
    finish(&config, &run.data, run.export(), ReportOptions::default())
}

fn handle_ridge(args: RidgeArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data);
    let run = pipeline::run_ridge(&config, args.lambda)?;
    let result = run.export()?;
    finish(&config, run.data(), result, ReportOptions::default())
}

fn handle_stagewise(args: StagewiseArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data);
    let options = StagewiseOptions {
        epsilon: args.epsilon,
        iterations: args.iterations,
        early_stop: args.early_stop,
    };
    let run = pipeline::run_stagewise(&config, options)?;
    if run.fit.stopped_early {
        log::info!("stagewise stopped after {} iterations", run.fit.iterations_run());
    }
    finish(
        &config,
        &run.data,
        run.export(),
        ReportOptions { show_trace: args.trace },
    )
}

fn handle_cv(args: CvArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data);
    let options = CrossValidationOptions {
        rounds: args.rounds,
        train_fraction: args.train_fraction,
        seed: args.seed,
    };
    let run = pipeline::run_cross_validation(&config, options)?;
    finish(&config, &run.data, run.export(), ReportOptions::default())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let export = crate::io::export::read_export_json(&args.file)?;
    println!("{}", crate::report::format_report(&export, ReportOptions { show_trace: true }));
    Ok(())
}

/// Print the report and write the optional export.
fn finish(config: &RunConfig, data: &Dataset, result: ExportResult, opts: ReportOptions) -> Result<(), AppError> {
    let export = crate::io::export::build_export(config, data, result);
    println!("{}", crate::report::format_report(&export, opts));

    if let Some(path) = &config.export {
        crate::io::export::write_export_json(path, &export)?;
    }
    Ok(())
}

pub fn run_config_from_args(args: &DataArgs) -> RunConfig {
    RunConfig {
        data_path: args.data.clone(),
        delimiter: args.delimiter,
        solver: args.solver,
        zero_variance: args.zero_variance,
        export: args.export.clone(),
    }
}
