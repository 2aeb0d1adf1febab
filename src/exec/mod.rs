//! Plan execution
//!
//! Walks a scheduled plan strictly in order, applying skip logic,
//! required-input checks, and failure propagation, and produces a
//! per-target run report.

mod report;
mod runner;

pub use report::{FailureReason, Outcome, OverallResult, RunReport, TargetResult};
pub use runner::run;
