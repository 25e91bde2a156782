//! Read/write result JSON files.
//!
//! An export is the portable record of one run:
//! - tool name + generation time
//! - input file, its shape, and the solver backend
//! - the command-specific result (`domain::ExportResult`)

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{Dataset, ExportFile, ExportResult, RunConfig};
use crate::error::AppError;

/// Wrap a command result with run metadata.
pub fn build_export(config: &RunConfig, data: &Dataset, result: ExportResult) -> ExportFile {
    ExportFile {
        tool: "regress".to_string(),
        generated_at: Utc::now(),
        data: config.data_path.display().to_string(),
        n_samples: data.n_samples(),
        n_features: data.n_features(),
        solver: config.solver,
        result,
    }
}

/// Write an export JSON file.
pub fn write_export_json(path: &Path, export: &ExportFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;

    log::info!("wrote {}", path.display());
    Ok(())
}

/// Read an export JSON file.
pub fn read_export_json(path: &Path) -> Result<ExportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open export JSON '{}': {e}", path.display())))?;
    let export: ExportFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid export JSON: {e}")))?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::Delimiter;
    use crate::math::{SolverKind, VariancePolicy};

    #[test]
    fn export_json_tags_the_command() {
        let data = Dataset::from_rows(&[vec![1.0], vec![2.0]], vec![2.0, 4.0]).unwrap();
        let config = RunConfig {
            data_path: PathBuf::from("data.txt"),
            delimiter: Delimiter::Tab,
            solver: SolverKind::Lu,
            zero_variance: VariancePolicy::Fail,
            export: None,
        };
        let export = build_export(
            &config,
            &data,
            ExportResult::Ols {
                weights: vec![2.0],
                rss: 0.0,
            },
        );

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["tool"], "regress");
        assert_eq!(json["n_samples"], 2);
        assert_eq!(json["solver"], "lu");
        assert_eq!(json["result"]["command"], "ols");

        let back: ExportFile = serde_json::from_value(json).unwrap();
        assert!(matches!(back.result, ExportResult::Ols { .. }));
    }

    #[test]
    fn export_file_reads_back_from_disk() {
        let data = Dataset::from_rows(&[vec![1.0, 0.5], vec![2.0, 1.5], vec![3.0, 0.0]], vec![1.0, 2.0, 3.0]).unwrap();
        let config = RunConfig {
            data_path: PathBuf::from("abalone.txt"),
            delimiter: Delimiter::Whitespace,
            solver: SolverKind::Svd,
            zero_variance: VariancePolicy::Skip,
            export: None,
        };
        let export = build_export(
            &config,
            &data,
            ExportResult::Stagewise {
                epsilon: 0.01,
                iterations: 2,
                weights: vec![0.02, -0.01],
                trace: vec![vec![0.01, 0.0], vec![0.02, -0.01]],
                rss: vec![1.5, 1.25],
                ols_weights: Some(vec![0.9, -0.4]),
            },
        );

        let path = std::env::temp_dir().join(format!("regress-{}-export.json", std::process::id()));
        write_export_json(&path, &export).unwrap();
        let back = read_export_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.data, "abalone.txt");
        assert_eq!(back.n_samples, 3);
        assert_eq!(back.n_features, 2);
        assert_eq!(back.solver, SolverKind::Svd);
        assert_eq!(back.generated_at, export.generated_at);
        match back.result {
            ExportResult::Stagewise {
                iterations,
                trace,
                rss,
                ols_weights,
                ..
            } => {
                assert_eq!(iterations, 2);
                assert_eq!(trace.len(), 2);
                assert_eq!(rss, vec![1.5, 1.25]);
                assert_eq!(ols_weights, Some(vec![0.9, -0.4]));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn reading_a_missing_export_is_an_input_error() {
        let err = read_export_json(Path::new("/nonexistent/regress-export.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
