//! Fast-tracking: overlapping or parallelizing dependent work.

use std::collections::BTreeMap;

use crate::graph::TaskGraph;
use crate::interner::NodeId;
use crate::models::RiskLevel;

use super::{EffortLevel, Opportunity, OpportunityKind};

/// Share of a task's duration recovered by overlapping it with its predecessors.
const OVERLAP_SAVING: f64 = 0.2;
/// Share of a group's combined duration recovered by running it in parallel.
const PARALLEL_SAVING: f64 = 0.3;

/// Tasks with two or more predecessors can start before all of them finish.
pub(crate) fn overlap_candidates(graph: &TaskGraph<'_>) -> Vec<Opportunity> {
    graph
        .nodes()
        .filter(|&node| graph.predecessor_count(node) >= 2)
        .map(|node| {
            let predecessors: Vec<&str> = graph
                .predecessors(node)
                .map(|edge| graph.task_id(edge.from))
                .collect();
            Opportunity {
                kind: OpportunityKind::DependencyOverlap,
                task_ids: vec![graph.task_id(node).to_string()],
                description: format!(
                    "Start {} while its predecessors ({}) are still finishing",
                    graph.task_id(node),
                    predecessors.join(", ")
                ),
                estimated_savings_hours: graph.duration(node) * OVERLAP_SAVING,
                risk: RiskLevel::Medium,
                effort: EffortLevel::Medium,
                on_critical_path: false,
                suggested_resource_ids: Vec::new(),
                additional_resources: 0,
            }
        })
        .collect()
}

/// Groups of tasks at the same depth of one connected component.
///
/// Same-depth tasks of a DAG share no path, so they can run side by side.
/// `topo_order` must be a topological order of `graph`.
pub(crate) fn parallel_groups(graph: &TaskGraph<'_>, topo_order: &[NodeId]) -> Vec<Opportunity> {
    let depths = graph.depths(topo_order);
    let mut groups = Vec::new();

    for component in graph.weakly_connected_components() {
        if component.len() < 2 {
            continue;
        }
        let mut by_depth: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for node in component {
            by_depth.entry(depths[node as usize]).or_default().push(node);
        }

        for (depth, members) in by_depth {
            if members.len() < 2 {
                continue;
            }
            let task_ids: Vec<String> = members
                .iter()
                .map(|&n| graph.task_id(n).to_string())
                .collect();
            let combined: f64 = members.iter().map(|&n| graph.duration(n)).sum();
            groups.push(Opportunity {
                kind: OpportunityKind::ParallelExecution,
                description: format!(
                    "Run {} in parallel (independent tasks at dependency depth {})",
                    task_ids.join(", "),
                    depth
                ),
                task_ids,
                estimated_savings_hours: combined * PARALLEL_SAVING,
                risk: RiskLevel::Low,
                effort: EffortLevel::Low,
                on_critical_path: false,
                suggested_resource_ids: Vec::new(),
                additional_resources: 0,
            });
        }
    }
    groups
}
