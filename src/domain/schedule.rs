//! Plan computation
//!
//! Turns one or more goal targets into a flat, deterministically ordered
//! execution plan: the transitive hard-dependency closure of the goals,
//! topologically sorted over hard and soft edges with a lexicographic
//! tie-break. The executor walks the plan in order with no further graph
//! logic of its own.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use super::graph::TargetGraph;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Unknown goal: {0}")]
    UnknownGoal(String),

    #[error("Ordering cycle among scheduled targets: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// An ordered sequence of target names ready for execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Plan(Vec<String>);

impl Plan {
    /// Iterates over target names in execution order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns true if the plan includes the target
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Returns the number of targets in the plan
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the plan is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the plan as a slice of names
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Computes the execution plan for the given goals
///
/// The plan contains exactly the union of each goal's transitive
/// hard-dependency closure, ordered once globally. Soft edges are honored
/// only between targets that are both in that closure; they never pull a
/// target into the plan. Ties between simultaneously ready targets break
/// toward the lexicographically smallest name, so the same graph and goals
/// always yield the same plan.
pub fn plan<S: AsRef<str>>(graph: &TargetGraph, goals: &[S]) -> Result<Plan, PlanError> {
    for goal in goals {
        if !graph.contains(goal.as_ref()) {
            return Err(PlanError::UnknownGoal(goal.as_ref().to_string()));
        }
    }

    // Transitive closure over hard edges only
    let mut reachable: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    for goal in goals {
        if let Some(target) = graph.target(goal.as_ref()) {
            stack.push(target.name.as_str());
        }
    }
    while let Some(name) = stack.pop() {
        if reachable.insert(name) {
            stack.extend(graph.hard_dependencies(name));
        }
    }

    // Kahn's algorithm over hard and soft edges within the closure,
    // popping the smallest ready name first
    let mut indegree: HashMap<&str, usize> = HashMap::new();
    for &name in &reachable {
        let count = graph
            .predecessors(name)
            .into_iter()
            .filter(|pred| reachable.contains(pred))
            .count();
        indegree.insert(name, count);
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(&name, _)| name)
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(reachable.len());
    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());
        for succ in graph.successors(name) {
            if let Some(count) = indegree.get_mut(succ) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(succ);
                }
            }
        }
    }

    if order.len() < reachable.len() {
        let mut stuck: Vec<String> = indegree
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        stuck.sort_unstable();
        return Err(PlanError::Cycle(stuck));
    }

    Ok(Plan(order))
}
