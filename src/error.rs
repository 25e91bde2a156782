//! Error types.
//!
//! - `RegressError` is the library taxonomy returned by the estimators, the
//!   standardization helpers and the ingest layer.
//! - `AppError` is what the binary reports: a message plus a process exit code.

use std::path::PathBuf;

use thiserror::Error;

pub type RegressResult<T> = Result<T, RegressError>;

#[derive(Debug, Error)]
pub enum RegressError {
    /// A required matrix inverse does not exist.
    #[error("{stage}: matrix is singular, cannot do inverse")]
    Singular { stage: &'static str },

    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    #[error("feature column {column} has zero variance and cannot be standardized")]
    DegenerateVariance { column: usize },

    #[error("invalid {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("dataset has no samples")]
    EmptyDataset,

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegressError {
    pub fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        RegressError::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    /// Process exit code used when this error ends a CLI run.
    pub fn exit_code(&self) -> u8 {
        match self {
            RegressError::MalformedInput { .. }
            | RegressError::InvalidParameter { .. }
            | RegressError::DimensionMismatch { .. }
            | RegressError::Io { .. } => 2,
            RegressError::EmptyDataset | RegressError::DegenerateVariance { .. } => 3,
            RegressError::Singular { .. } => 4,
        }
    }

    pub fn is_singular(&self) -> bool {
        matches!(self, RegressError::Singular { .. })
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<RegressError> for AppError {
    fn from(err: RegressError) -> Self {
        let message = match &err {
            RegressError::DegenerateVariance { .. } => {
                format!("{err} (rerun with `--zero-variance skip` to leave such columns unscaled)")
            }
            _ => err.to_string(),
        };
        AppError::new(err.exit_code(), message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
