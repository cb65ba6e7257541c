//! Task graph model: an arena of tasks with index-based dependency edges.
//!
//! Every downstream analysis builds one of these from the caller's snapshot.
//! Malformed dependencies (dangling endpoints, self links) are dropped and
//! recorded as warnings; cycles are kept so they can be reported.

use serde::{Deserialize, Serialize};

use crate::interner::{NodeId, TaskIdInterner};
use crate::models::{sanitize_duration, DataWarning, Dependency, DependencyType, Task};

/// A dependency edge between two interned tasks.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub dependency_type: DependencyType,
    pub lag: f64,
}

/// A dependency edge named by task ids, used in errors and reports.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeRef {
    pub predecessor_id: String,
    pub successor_id: String,
}

impl std::fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.predecessor_id, self.successor_id)
    }
}

/// Back edge found during topological visitation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackEdge {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    InProgress,
    Done,
}

/// Predecessor/successor adjacency over a task snapshot.
#[derive(Debug, Clone)]
pub struct TaskGraph<'a> {
    index: TaskIdInterner,
    tasks: Vec<&'a Task>,
    durations: Vec<f64>,
    edges: Vec<GraphEdge>,
    /// Incoming edge indices per node.
    predecessors: Vec<Vec<usize>>,
    /// Outgoing edge indices per node.
    successors: Vec<Vec<usize>>,
    warnings: Vec<DataWarning>,
}

impl<'a> TaskGraph<'a> {
    /// Build the graph. Never fails; bad input becomes warnings.
    pub fn build(tasks: &'a [Task], dependencies: &[Dependency]) -> Self {
        let mut index = TaskIdInterner::with_capacity(tasks.len());
        let mut nodes = Vec::with_capacity(tasks.len());
        let mut durations = Vec::with_capacity(tasks.len());
        let mut warnings = Vec::new();

        for task in tasks {
            if index.insert_new(&task.id).is_none() {
                warnings.push(DataWarning::DuplicateTask {
                    task_id: task.id.clone(),
                });
                continue;
            }
            durations.push(sanitize_duration(task, &mut warnings));
            nodes.push(task);
        }

        let n = nodes.len();
        let mut edges = Vec::with_capacity(dependencies.len());
        let mut predecessors = vec![Vec::new(); n];
        let mut successors = vec![Vec::new(); n];

        for dep in dependencies {
            if dep.predecessor_id == dep.successor_id {
                warnings.push(DataWarning::SelfDependency {
                    task_id: dep.predecessor_id.clone(),
                });
                continue;
            }
            let (Some(from), Some(to)) = (
                index.get(&dep.predecessor_id),
                index.get(&dep.successor_id),
            ) else {
                warnings.push(DataWarning::DanglingDependency {
                    predecessor_id: dep.predecessor_id.clone(),
                    successor_id: dep.successor_id.clone(),
                });
                continue;
            };

            let edge_idx = edges.len();
            edges.push(GraphEdge {
                from,
                to,
                dependency_type: dep.dependency_type,
                lag: if dep.lag_hours.is_finite() {
                    dep.lag_hours
                } else {
                    0.0
                },
            });
            successors[from as usize].push(edge_idx);
            predecessors[to as usize].push(edge_idx);
        }

        Self {
            index,
            tasks: nodes,
            durations,
            edges,
            predecessors,
            successors,
            warnings,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn node(&self, task_id: &str) -> Option<NodeId> {
        self.index.get(task_id)
    }

    pub fn task(&self, node: NodeId) -> &'a Task {
        self.tasks[node as usize]
    }

    pub fn task_id(&self, node: NodeId) -> &str {
        self.index.resolve(node)
    }

    /// Sanitized duration in hours.
    pub fn duration(&self, node: NodeId) -> f64 {
        self.durations[node as usize]
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.tasks.len() as NodeId
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.predecessors[node as usize]
            .iter()
            .map(move |&e| &self.edges[e])
    }

    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.successors[node as usize]
            .iter()
            .map(move |&e| &self.edges[e])
    }

    pub fn predecessor_count(&self, node: NodeId) -> usize {
        self.predecessors[node as usize].len()
    }

    pub fn is_sink(&self, node: NodeId) -> bool {
        self.successors[node as usize].is_empty()
    }

    /// Tasks with no predecessors, in input order.
    pub fn sources(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|&n| self.predecessors[n as usize].is_empty())
            .collect()
    }

    /// Tasks with no successors, in input order.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes().filter(|&n| self.is_sink(n)).collect()
    }

    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    pub fn edge_ref(&self, edge: &GraphEdge) -> EdgeRef {
        EdgeRef {
            predecessor_id: self.task_id(edge.from).to_string(),
            successor_id: self.task_id(edge.to).to_string(),
        }
    }

    /// Deterministic topological order via iterative depth-first visitation.
    ///
    /// Nodes are visited as roots in input order; the reverse post-order is
    /// returned. Reaching a node that is still in progress means a back edge,
    /// which is returned instead of an order.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, BackEdge> {
        let n = self.len();
        let mut state = vec![Visit::New; n];
        let mut post_order: Vec<NodeId> = Vec::with_capacity(n);
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for root in self.nodes() {
            if state[root as usize] != Visit::New {
                continue;
            }
            state[root as usize] = Visit::InProgress;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let outgoing = &self.successors[node as usize];
                if frame.1 < outgoing.len() {
                    let next = self.edges[outgoing[frame.1]].to;
                    frame.1 += 1;
                    match state[next as usize] {
                        Visit::New => {
                            state[next as usize] = Visit::InProgress;
                            stack.push((next, 0));
                        }
                        Visit::InProgress => return Err(BackEdge { from: node, to: next }),
                        Visit::Done => {}
                    }
                } else {
                    state[node as usize] = Visit::Done;
                    post_order.push(node);
                    stack.pop();
                }
            }
        }

        post_order.reverse();
        Ok(post_order)
    }

    /// Whether `to` is reachable from `from` along dependency edges.
    pub fn has_path(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.len()];
        let mut stack = vec![from];
        visited[from as usize] = true;

        while let Some(node) = stack.pop() {
            for edge in self.successors(node) {
                if edge.to == to {
                    return true;
                }
                if !visited[edge.to as usize] {
                    visited[edge.to as usize] = true;
                    stack.push(edge.to);
                }
            }
        }
        false
    }

    /// Every edge that closes a cycle: its successor can reach its predecessor.
    pub fn cyclic_edges(&self) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|edge| self.has_path(edge.to, edge.from))
            .collect()
    }

    /// Components of the graph with edge direction ignored.
    ///
    /// Each component lists its nodes in ascending order; components are
    /// ordered by their first node.
    pub fn weakly_connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut component_of: Vec<Option<usize>> = vec![None; self.len()];
        let mut components: Vec<Vec<NodeId>> = Vec::new();

        for root in self.nodes() {
            if component_of[root as usize].is_some() {
                continue;
            }
            let component_idx = components.len();
            let mut members = vec![root];
            let mut stack = vec![root];
            component_of[root as usize] = Some(component_idx);

            while let Some(node) = stack.pop() {
                let neighbours = self
                    .successors(node)
                    .map(|e| e.to)
                    .chain(self.predecessors(node).map(|e| e.from));
                for next in neighbours {
                    if component_of[next as usize].is_none() {
                        component_of[next as usize] = Some(component_idx);
                        members.push(next);
                        stack.push(next);
                    }
                }
            }

            members.sort_unstable();
            components.push(members);
        }

        components
    }

    /// Longest edge count from any source, given a topological order.
    pub fn depths(&self, topo_order: &[NodeId]) -> Vec<usize> {
        let mut depth = vec![0usize; self.len()];
        for &node in topo_order {
            for edge in self.successors(node) {
                let candidate = depth[node as usize] + 1;
                if candidate > depth[edge.to as usize] {
                    depth[edge.to as usize] = candidate;
                }
            }
        }
        depth
    }
}
