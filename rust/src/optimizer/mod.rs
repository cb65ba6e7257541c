//! Schedule compression recommendations: fast-tracking and crashing.
//!
//! Every recommendation is a heuristic with an estimated saving, a risk and
//! an effort level. Nothing here is guaranteed to be optimal.

mod crashing;
mod fast_track;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::critical_path::calculate_on_graph;
use crate::graph::TaskGraph;
use crate::models::{dedup_warnings, DataWarning, Dependency, Resource, RiskLevel, Task};
use crate::{log_changes, log_checks};

/// Kind of compression technique, in ranking order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    ParallelExecution,
    DependencyOverlap,
    Crashing,
}

/// Effort needed to act on a recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Low,
    Medium,
    High,
}

/// One way to shorten the schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    pub task_ids: Vec<String>,
    pub description: String,
    pub estimated_savings_hours: f64,
    pub risk: RiskLevel,
    pub effort: EffortLevel,
    /// Whether any of the tasks is critical. False when the critical path is unknown.
    pub on_critical_path: bool,
    /// Crashing only: least-loaded resources not yet on the task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_resource_ids: Vec<String>,
    #[serde(default)]
    pub additional_resources: usize,
}

/// Fast-track and crash opportunities plus the ranked recommendation list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub fast_track: Vec<Opportunity>,
    pub crashing: Vec<Opportunity>,
    /// Parallel execution first, then dependency overlap, then crashing.
    pub recommendations: Vec<Opportunity>,
    pub total_potential_savings_hours: f64,
    /// Current project duration, when the graph is acyclic.
    pub project_duration: Option<f64>,
    pub warnings: Vec<DataWarning>,
}

fn rank(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| b.estimated_savings_hours.total_cmp(&a.estimated_savings_hours))
            .then_with(|| a.task_ids.first().cmp(&b.task_ids.first()))
    });
}

/// Suggest fast-tracking and crashing opportunities for a task snapshot.
///
/// On cyclic input the critical path and parallel groups are unavailable;
/// the remaining suggestions are still produced and a warning is attached.
pub fn optimize_schedule(
    tasks: &[Task],
    dependencies: &[Dependency],
    resources: &[Resource],
    config: &AnalysisConfig,
) -> OptimizationReport {
    let graph = TaskGraph::build(tasks, dependencies);
    let mut warnings = graph.warnings().to_vec();

    let mut fast_track = fast_track::overlap_candidates(&graph);
    match graph.topological_order() {
        Ok(order) => fast_track.extend(fast_track::parallel_groups(&graph, &order)),
        Err(back_edge) => {
            let edge = format!(
                "{} -> {}",
                graph.task_id(back_edge.from),
                graph.task_id(back_edge.to)
            );
            log_checks!(config.verbosity, "skipping parallel groups, cycle at {}", edge);
            warnings.push(DataWarning::CyclicGraph {
                detail: format!("parallel execution analysis skipped at edge {}", edge),
            });
        }
    }
    let mut crashing = crashing::crash_candidates(&graph, resources);

    let critical = calculate_on_graph(&graph, config).ok();
    if let Some(result) = &critical {
        for opportunity in fast_track.iter_mut().chain(crashing.iter_mut()) {
            opportunity.on_critical_path =
                opportunity.task_ids.iter().any(|id| result.is_critical(id));
        }
    }

    rank(&mut fast_track);
    rank(&mut crashing);
    let mut recommendations: Vec<Opportunity> =
        fast_track.iter().chain(crashing.iter()).cloned().collect();
    rank(&mut recommendations);

    let total_potential_savings_hours = recommendations
        .iter()
        .map(|o| o.estimated_savings_hours)
        .sum();
    log_changes!(
        config.verbosity,
        "{} compression opportunities, {:.1}h potential savings",
        recommendations.len(),
        total_potential_savings_hours
    );

    dedup_warnings(&mut warnings);
    OptimizationReport {
        fast_track,
        crashing,
        recommendations,
        total_potential_savings_hours,
        project_duration: critical.map(|r| r.project_duration),
        warnings,
    }
}
