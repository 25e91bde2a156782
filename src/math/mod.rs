//! Mathematical utilities: linear solvers, standardization and error metrics.

pub mod metrics;
pub mod scale;
pub mod solver;

pub use metrics::*;
pub use scale::*;
pub use solver::*;
