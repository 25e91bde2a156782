//! Input/output helpers.
//!
//! - delimited-text ingest + validation (`ingest`)
//! - JSON result exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
