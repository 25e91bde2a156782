//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the training set (`Dataset`)
//! - input/run configuration (`Delimiter`, `RunConfig`)
//! - the JSON export schema (`ExportFile`, `ExportResult`)

pub mod types;

pub use types::*;
