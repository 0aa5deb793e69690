//! Domain models for Gameday.
//!
//! - `ScoreReport`: outcome of a heuristic feature check
//! - `DependencyReport`: outcome of the external-resource audit
//! - `GamedayError`: transport and I/O failures

pub mod error;
pub mod report;

pub use error::{GamedayError, Result};
pub use report::{DependencyReport, ScoreReport};
