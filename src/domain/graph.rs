//! Target graph
//!
//! Validates a registration set of targets into an immutable directed
//! graph. `depends_on` produces hard edges (must run and succeed first);
//! `before`/`after` produce soft edges (ordering only). Name uniqueness,
//! reference resolution, and hard-edge cycle detection all happen here, at
//! registration time, before anything executes. Uses petgraph.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::target::Target;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate target name: {0}")]
    DuplicateTarget(String),

    #[error("Target '{referrer}' references unknown target '{name}'")]
    UnknownTarget { referrer: String, name: String },

    #[error("Dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// Kind of an edge in the target graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// From `depends_on`: predecessor must run and succeed
    Hard,
    /// From `before`/`after`: ordering only, no reachability
    Soft,
}

/// An immutable, validated graph of targets
///
/// Edges point in execution direction: an edge `a -> b` means `a` runs
/// before `b`.
pub struct TargetGraph {
    graph: DiGraph<String, EdgeKind>,
    node_map: HashMap<String, NodeIndex>,
    targets: HashMap<String, Target>,
}

impl TargetGraph {
    /// Validates a collection of targets into a graph
    ///
    /// Fails on duplicate names, references to unknown targets, and cycles
    /// in the hard-edge subgraph. A cycle formed only by soft edges is not
    /// an error here; it surfaces at planning time if the involved targets
    /// are ever scheduled together.
    pub fn from_targets(targets: impl IntoIterator<Item = Target>) -> Result<Self, GraphError> {
        let targets: Vec<Target> = targets.into_iter().collect();

        let mut graph = DiGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

        // First pass: register all names
        for target in &targets {
            if node_map.contains_key(&target.name) {
                return Err(GraphError::DuplicateTarget(target.name.clone()));
            }
            let idx = graph.add_node(target.name.clone());
            node_map.insert(target.name.clone(), idx);
        }

        // Second pass: resolve references and add edges
        for target in &targets {
            let this = node_map[&target.name];

            let resolve = |name: &str| {
                node_map
                    .get(name)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownTarget {
                        referrer: target.name.clone(),
                        name: name.to_string(),
                    })
            };

            for dep in &target.depends_on {
                let dep_idx = resolve(dep)?;
                add_edge(&mut graph, dep_idx, this, EdgeKind::Hard);
            }
            for succ in &target.before {
                let succ_idx = resolve(succ)?;
                add_edge(&mut graph, this, succ_idx, EdgeKind::Soft);
            }
            for pred in &target.after {
                let pred_idx = resolve(pred)?;
                add_edge(&mut graph, pred_idx, this, EdgeKind::Soft);
            }
        }

        if let Some(cycle) = find_hard_cycle(&graph) {
            return Err(GraphError::Cycle(cycle));
        }

        let targets = targets
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();

        Ok(Self {
            graph,
            node_map,
            targets,
        })
    }

    /// Returns the target definition for a name
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Returns true if the graph contains the target
    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Returns the number of targets in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns all target names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.node_map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the hard dependencies of a target (targets it depends on)
    pub fn hard_dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming, Some(EdgeKind::Hard))
    }

    /// Returns the hard dependents of a target (targets that depend on it)
    pub fn hard_dependents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing, Some(EdgeKind::Hard))
    }

    /// Returns every target ordered before this one (hard and soft)
    pub fn predecessors(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming, None)
    }

    /// Returns every target ordered after this one (hard and soft)
    pub fn successors(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing, None)
    }

    fn neighbors(&self, name: &str, dir: Direction, kind: Option<EdgeKind>) -> Vec<&str> {
        let idx = match self.node_map.get(name) {
            Some(idx) => *idx,
            None => return Vec::new(),
        };

        let mut names: Vec<&str> = self
            .graph
            .edges_directed(idx, dir)
            .filter(|e| kind.map(|k| *e.weight() == k).unwrap_or(true))
            .map(|e| match dir {
                Direction::Incoming => e.source(),
                Direction::Outgoing => e.target(),
            })
            .map(|idx| self.graph[idx].as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Adds an edge, never downgrading an existing hard edge to soft
fn add_edge(graph: &mut DiGraph<String, EdgeKind>, from: NodeIndex, to: NodeIndex, kind: EdgeKind) {
    match graph.find_edge(from, to) {
        Some(edge) => {
            if kind == EdgeKind::Hard {
                graph[edge] = EdgeKind::Hard;
            }
        }
        None => {
            graph.add_edge(from, to, kind);
        }
    }
}

/// Finds a cycle in the hard-edge subgraph, if any
///
/// Depth-first search with recursion-stack marking; returns the ordered
/// names forming the cycle. Visit order is sorted by name so the reported
/// cycle is stable across runs.
fn find_hard_cycle(graph: &DiGraph<String, EdgeKind>) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    fn visit(
        graph: &DiGraph<String, EdgeKind>,
        node: NodeIndex,
        marks: &mut [Mark],
        stack: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        marks[node.index()] = Mark::OnStack;
        stack.push(node);

        let mut succs: Vec<NodeIndex> = graph
            .edges(node)
            .filter(|e| *e.weight() == EdgeKind::Hard)
            .map(|e| e.target())
            .collect();
        succs.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

        for succ in succs {
            match marks[succ.index()] {
                Mark::Unvisited => {
                    if let Some(cycle) = visit(graph, succ, marks, stack) {
                        return Some(cycle);
                    }
                }
                Mark::OnStack => {
                    let pos = stack.iter().position(|n| *n == succ)?;
                    return Some(stack[pos..].to_vec());
                }
                Mark::Done => {}
            }
        }

        stack.pop();
        marks[node.index()] = Mark::Done;
        None
    }

    let mut roots: Vec<NodeIndex> = graph.node_indices().collect();
    roots.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

    let mut marks = vec![Mark::Unvisited; graph.node_count()];
    let mut stack = Vec::new();

    for root in roots {
        if marks[root.index()] == Mark::Unvisited {
            if let Some(cycle) = visit(graph, root, &mut marks, &mut stack) {
                return Some(cycle.into_iter().map(|idx| graph[idx].clone()).collect());
            }
        }
    }

    None
}
