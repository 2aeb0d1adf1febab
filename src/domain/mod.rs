//! Domain models for Forge
//!
//! Contains the target graph and scheduling logic without any I/O concerns.

mod context;
mod target;
mod graph;
mod schedule;

pub use context::RunContext;
pub use target::{Action, Condition, Target};
pub use graph::{EdgeKind, GraphError, TargetGraph};
pub use schedule::{plan, Plan, PlanError};
