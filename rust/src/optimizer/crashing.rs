//! Crashing: shortening long tasks by adding resources.

use rustc_hash::FxHashMap;

use crate::graph::TaskGraph;
use crate::models::{Resource, RiskLevel};

use super::{EffortLevel, Opportunity, OpportunityKind};

/// Only tasks longer than this many hours are worth crashing.
const MIN_CRASH_DURATION: f64 = 24.0;
/// Tasks already staffed beyond this are left alone.
const MAX_CURRENT_ASSIGNEES: usize = 2;
const MAX_ADDED_ASSIGNEES: usize = 2;
const MAX_TOTAL_ASSIGNEES: usize = 4;
const CRASH_SAVING: f64 = 0.4;
const MAX_CRASH_SAVING_HOURS: f64 = 16.0;

/// Hours of assigned work per known resource.
fn resource_load<'r>(
    graph: &TaskGraph<'_>,
    resources: &'r [Resource],
) -> FxHashMap<&'r str, f64> {
    let mut load: FxHashMap<&str, f64> =
        resources.iter().map(|r| (r.id.as_str(), 0.0)).collect();
    for node in graph.nodes() {
        for assignee in &graph.task(node).assignee_ids {
            if let Some(hours) = load.get_mut(assignee.as_str()) {
                *hours += graph.duration(node);
            }
        }
    }
    load
}

/// Long, lightly staffed tasks with the least-loaded free resources to add.
pub(crate) fn crash_candidates(graph: &TaskGraph<'_>, resources: &[Resource]) -> Vec<Opportunity> {
    let load = resource_load(graph, resources);
    let mut by_load: Vec<(&str, f64)> = load.into_iter().collect();
    by_load.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    graph
        .nodes()
        .filter_map(|node| {
            let task = graph.task(node);
            let duration = graph.duration(node);
            let assigned = task.assignee_ids.len();
            if duration <= MIN_CRASH_DURATION || assigned > MAX_CURRENT_ASSIGNEES {
                return None;
            }
            let additional = MAX_ADDED_ASSIGNEES.min(MAX_TOTAL_ASSIGNEES.saturating_sub(assigned));
            let suggested: Vec<String> = by_load
                .iter()
                .filter(|(id, _)| !task.assignee_ids.contains(*id))
                .take(additional)
                .map(|(id, _)| id.to_string())
                .collect();
            let savings = (duration * CRASH_SAVING).min(MAX_CRASH_SAVING_HOURS);

            Some(Opportunity {
                kind: OpportunityKind::Crashing,
                task_ids: vec![task.id.clone()],
                description: format!(
                    "Add up to {} assignees to {} ({:.1}h, {} assigned)",
                    additional, task.id, duration, assigned
                ),
                estimated_savings_hours: savings,
                risk: RiskLevel::Medium,
                effort: EffortLevel::High,
                on_critical_path: false,
                suggested_resource_ids: suggested,
                additional_resources: additional,
            })
        })
        .collect()
}
