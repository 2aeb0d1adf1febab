//! Forge - A declarative task-graph build runner
//!
//! Forge organizes build work as named targets with explicit dependency and
//! ordering constraints. Targets are validated into a graph, scheduled into
//! a deterministic plan, and executed sequentially with per-target outcome
//! reporting.

pub mod domain;
pub mod exec;
pub mod manifest;
pub mod cli;

pub use domain::{Plan, RunContext, Target, TargetGraph};
pub use exec::{Outcome, OverallResult, RunReport};
