//! Target domain model
//!
//! A target is a named unit of build work with dependency constraints,
//! ordering hints, a conditional gate, and required inputs. Targets are
//! plain records: all constraints are explicit fields set at construction,
//! and the set of targets is immutable once validated into a graph.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use super::context::RunContext;

/// Predicate evaluated against the run context to decide whether a target
/// runs or is skipped
pub type Condition = Box<dyn Fn(&RunContext) -> bool>;

/// The opaque body of a target; fails by returning an error
pub type Action = Box<dyn Fn(&RunContext) -> Result<()>>;

/// A named unit of build work
pub struct Target {
    /// Unique name within a registration set
    pub name: String,

    /// Names of targets that must complete successfully before this one runs
    pub depends_on: Vec<String>,

    /// Names of targets this one must precede, if they are scheduled at all
    pub before: Vec<String>,

    /// Names of targets this one must follow, if they are scheduled at all
    pub after: Vec<String>,

    /// Named inputs that must be set (non-empty) for this target to execute
    pub requires: Vec<String>,

    /// Optional gate; when it evaluates false the target is skipped and
    /// treated as vacuously successful
    pub condition: Option<Condition>,

    /// The work itself
    pub action: Action,

    /// Declared output paths (advisory, not used for caching)
    pub produces: Vec<PathBuf>,

    /// Optional human-readable description
    pub description: Option<String>,
}

impl Target {
    /// Creates a target with the given name and action and no constraints
    pub fn new(
        name: impl Into<String>,
        action: impl Fn(&RunContext) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            requires: Vec::new(),
            condition: None,
            action: Box::new(action),
            produces: Vec::new(),
            description: None,
        }
    }

    /// Returns true if the target's condition allows it to run
    ///
    /// Targets without a condition always run.
    pub fn is_enabled(&self, ctx: &RunContext) -> bool {
        self.condition.as_ref().map(|c| c(ctx)).unwrap_or(true)
    }

    /// Returns the first required input that is missing or empty, if any
    pub fn missing_requirement(&self, ctx: &RunContext) -> Option<&str> {
        self.requires
            .iter()
            .find(|input| !ctx.is_set(input))
            .map(String::as_str)
    }

    /// Iterates over every target name this target references
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.depends_on
            .iter()
            .chain(self.before.iter())
            .chain(self.after.iter())
            .map(String::as_str)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("requires", &self.requires)
            .field("has_condition", &self.condition.is_some())
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}
