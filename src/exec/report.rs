//! Run report: per-target outcomes and the overall result

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why a target failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// A required input was absent or empty; halts the whole run
    MissingRequirement { input: String },
    /// A hard dependency failed, so the action was never invoked
    UpstreamFailure { dependency: String },
    /// The action itself returned an error
    Action { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingRequirement { input } => {
                write!(f, "required input '{}' is not set", input)
            }
            FailureReason::UpstreamFailure { dependency } => {
                write!(f, "dependency '{}' failed", dependency)
            }
            FailureReason::Action { message } => write!(f, "{}", message),
        }
    }
}

/// Outcome of a single target within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The action completed without error
    Succeeded,
    /// The condition evaluated false; treated as vacuously successful
    Skipped,
    Failed(FailureReason),
    /// Never attempted because an earlier missing requirement halted the run
    NotRun,
}

impl Outcome {
    /// Returns true for outcomes that do not block dependents
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded | Outcome::Skipped)
    }

    /// Returns true for any failure, including cascaded ones
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Returns a short display label for the outcome
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "ok",
            Outcome::Skipped => "skip",
            Outcome::Failed(_) => "fail",
            Outcome::NotRun => "not run",
        }
    }
}

/// Outcome and timing for one target, in plan order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetResult {
    pub name: String,
    pub outcome: Outcome,
    /// Wall time spent in the action, in milliseconds; zero when the
    /// action never ran
    pub duration_ms: u64,
}

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallResult {
    /// Every target succeeded or was validly skipped
    Success,
    /// At least one target failed; unrelated branches still ran
    Failure,
    /// A missing required input halted the run
    Fatal,
}

impl OverallResult {
    /// Returns the process exit code this result maps to
    pub fn exit_code(&self) -> u8 {
        match self {
            OverallResult::Success => 0,
            OverallResult::Failure => 1,
            OverallResult::Fatal => 2,
        }
    }
}

/// The full record of one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub results: Vec<TargetResult>,
    pub overall: OverallResult,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Assembles a report, deriving the overall result from the outcomes
    pub fn new(
        results: Vec<TargetResult>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let overall = Self::overall_of(&results);
        Self {
            results,
            overall,
            started_at,
            finished_at,
        }
    }

    fn overall_of(results: &[TargetResult]) -> OverallResult {
        let fatal = results.iter().any(|r| {
            matches!(
                r.outcome,
                Outcome::Failed(FailureReason::MissingRequirement { .. })
            )
        });
        if fatal {
            return OverallResult::Fatal;
        }
        if results.iter().all(|r| r.outcome.is_success()) {
            OverallResult::Success
        } else {
            OverallResult::Failure
        }
    }

    /// Returns the outcome recorded for a target, if it was in the plan
    pub fn outcome_of(&self, name: &str) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }

    /// Returns true if the overall result is `Success`
    pub fn is_success(&self) -> bool {
        self.overall == OverallResult::Success
    }
}
