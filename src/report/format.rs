//! Formatted terminal output.
//!
//! Every command prints from the same `ExportFile` it would write with
//! `--export`, so a live run and `regress show` render identically.

use crate::domain::{BandwidthScore, ExportFile, ExportResult};

/// Options that only affect what gets printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Print every stage-wise iteration, not just the final weights.
    pub show_trace: bool,
}

/// Format a run (header + command-specific body).
pub fn format_report(export: &ExportFile, opts: ReportOptions) -> String {
    let mut out = format_header(export);
    out.push('\n');

    let body = match &export.result {
        ExportResult::Ols { weights, rss } => format_ols(weights, *rss),
        ExportResult::Lwlr {
            train_rows,
            test_rows,
            bandwidths,
            ols_test_rss,
        } => format_lwlr(*train_rows, *test_rows, bandwidths, *ols_test_rss),
        ExportResult::Ridge {
            lambda,
            weights,
            raw_weights,
            intercept,
        } => format_ridge(*lambda, weights, raw_weights, *intercept),
        ExportResult::RidgePath { penalties, weights } => format_ridge_path(penalties, weights),
        ExportResult::Stagewise {
            epsilon,
            iterations,
            weights,
            trace,
            rss,
            ols_weights,
        } => format_stagewise(*epsilon, *iterations, weights, trace, rss, ols_weights.as_deref(), opts),
        ExportResult::CrossValidation {
            rounds,
            seed,
            penalties,
            mean_errors,
            best_penalty,
            raw_weights,
            intercept,
        } => format_cross_validation(*rounds, *seed, penalties, mean_errors, *best_penalty, raw_weights, *intercept),
    };
    out.push_str(&body);
    out
}

fn format_header(export: &ExportFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} - {} ===\n", export.tool, command_title(&export.result)));
    out.push_str(&format!("Data: {}\n", export.data));
    out.push_str(&format!(
        "Samples: m={} | features: n={}\n",
        export.n_samples, export.n_features
    ));
    out.push_str(&format!(
        "Solver: {:?} | generated {}\n",
        export.solver,
        export.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

fn command_title(result: &ExportResult) -> &'static str {
    match result {
        ExportResult::Ols { .. } => "ordinary least squares",
        ExportResult::Lwlr { .. } => "locally weighted linear regression",
        ExportResult::Ridge { .. } => "ridge regression",
        ExportResult::RidgePath { .. } => "ridge regularization path",
        ExportResult::Stagewise { .. } => "forward stage-wise regression",
        ExportResult::CrossValidation { .. } => "ridge cross-validation",
    }
}

fn format_ols(weights: &[f64], rss: f64) -> String {
    let mut out = String::new();
    out.push_str("Weights:\n");
    out.push_str(&format_weights(weights));
    out.push_str(&format!("Training RSS: {rss:.6}\n"));
    out
}

fn format_lwlr(
    train_rows: usize,
    test_rows: usize,
    scores: &[BandwidthScore],
    ols_test_rss: Option<f64>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Training rows: {train_rows} | holdout rows: {test_rows}\n\n"));

    out.push_str(&format!(
        "{:>12} {:>16} {:>16} {:>9}\n",
        "bandwidth", "train RSS", "holdout RSS", "singular"
    ));
    out.push_str(&format!("{:->12} {:->16} {:->16} {:->9}\n", "", "", "", ""));
    for s in scores {
        out.push_str(&format!(
            "{:>12} {:>16} {:>16} {:>9}\n",
            format!("{}", s.bandwidth),
            fmt_opt(s.train_rss),
            if test_rows > 0 { fmt_opt(s.test_rss) } else { "-".to_string() },
            s.singular_queries
        ));
    }

    if test_rows > 0 {
        out.push_str(&format!("\nOLS baseline holdout RSS: {}\n", fmt_opt(ols_test_rss)));
    }
    out.trim_end().to_string() + "\n"
}

fn format_ridge(lambda: f64, weights: &[f64], raw_weights: &[f64], intercept: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Penalty: lambda={lambda}\n\n"));
    out.push_str("Weights (standardized features):\n");
    out.push_str(&format_weights(weights));
    out.push_str("\nWeights (raw features):\n");
    out.push_str(&format_weights(raw_weights));
    out.push_str(&format!("  intercept = {intercept:.6}\n"));
    out
}

fn format_ridge_path(penalties: &[f64], weights: &[Vec<f64>]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>3} {:>12} {:>7} {:>12}  {}\n",
        "i", "lambda", "ln", "||w||", "weights"
    ));
    out.push_str(&format!("{:->3} {:->12} {:->7} {:->12}  {:-<7}\n", "", "", "", "", ""));
    for (i, (lambda, w)) in penalties.iter().zip(weights).enumerate() {
        out.push_str(&format!(
            "{:>3} {:>12.4e} {:>7.2} {:>12.6}  {}\n",
            i,
            lambda,
            lambda.ln(),
            norm(w),
            fmt_vec(w)
        ));
    }
    out
}

fn format_stagewise(
    epsilon: f64,
    iterations: usize,
    weights: &[f64],
    trace: &[Vec<f64>],
    rss: &[f64],
    ols_weights: Option<&[f64]>,
    opts: ReportOptions,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Step: epsilon={epsilon} | iterations run: {iterations}\n"));

    if opts.show_trace {
        out.push('\n');
        out.push_str(&format!("{:>6} {:>14}  {}\n", "iter", "RSS", "weights"));
        out.push_str(&format!("{:->6} {:->14}  {:-<7}\n", "", "", ""));
        for (it, (w, r)) in trace.iter().zip(rss).enumerate() {
            out.push_str(&format!("{:>6} {:>14.6}  {}\n", it + 1, r, fmt_vec(w)));
        }
    }

    out.push_str("\nFinal weights (standardized features):\n");
    out.push_str(&format_weights(weights));
    if let Some(last) = rss.last() {
        out.push_str(&format!("Training RSS (centered target): {last:.6}\n"));
    }

    match ols_weights {
        Some(ols) => {
            out.push_str("\nOLS on the same standardized data:\n");
            out.push_str(&format_weights(ols));
        }
        None => out.push_str("\nOLS comparison unavailable (singular system).\n"),
    }
    out
}

fn format_cross_validation(
    rounds: usize,
    seed: u64,
    penalties: &[f64],
    mean_errors: &[f64],
    best_penalty: f64,
    raw_weights: &[f64],
    intercept: f64,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Rounds: {rounds} | seed: {seed}\n\n"));

    out.push_str(&format!("{:>3} {:>12} {:>16}\n", "i", "lambda", "mean RSS"));
    out.push_str(&format!("{:->3} {:->12} {:->16}\n", "", "", ""));
    for (i, (lambda, err)) in penalties.iter().zip(mean_errors).enumerate() {
        let marker = if *lambda == best_penalty { " *" } else { "" };
        out.push_str(&format!("{:>3} {:>12.4e} {:>16.6}{marker}\n", i, lambda, err));
    }

    out.push_str(&format!("\nBest penalty: lambda={best_penalty:.6e}\n"));
    out.push_str("Refitted model (raw features):\n");
    out.push_str(&format_weights(raw_weights));
    out.push_str(&format!("  intercept = {intercept:.6}\n"));
    out
}

fn format_weights(weights: &[f64]) -> String {
    weights
        .iter()
        .enumerate()
        .map(|(j, w)| format!("  w[{j}] = {w:.6}\n"))
        .collect()
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.6}"),
        None => "singular".to_string(),
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let inner: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", inner.join(", "))
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
