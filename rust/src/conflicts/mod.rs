//! Conflict detection: circular dependencies, timeline violations and
//! resource over-allocation.

mod timeline;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::graph::{GraphEdge, TaskGraph};
use crate::models::{
    dedup_warnings, duration_hours, hours_to_duration, task_window, DataWarning, Dependency,
    DependencyType, ResourceAllocation, Severity, Task,
};
use crate::{log_changes, log_checks};

pub use timeline::{
    build_timelines, overload_windows, AllocationEntry, AllocationTimelines, OverloadWindow,
};

/// Kind of scheduling conflict, in reporting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    CircularDependency,
    TimelineViolation,
    ResourceOverload,
}

/// Calendar window a conflict applies to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictWindow {
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
}

/// A detected scheduling problem. Computed on demand, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub message: String,
    pub affected_task_ids: Vec<String>,
    pub suggested_resolution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<ConflictWindow>,
    /// Peak accumulated allocation percentage (resource overloads only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulated_allocation: Option<f64>,
}

/// Conflict counts per severity and per type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<ConflictType, usize>,
}

impl ConflictSummary {
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        let mut summary = Self {
            total: conflicts.len(),
            ..Default::default()
        };
        for conflict in conflicts {
            *summary.by_severity.entry(conflict.severity).or_default() += 1;
            *summary.by_type.entry(conflict.conflict_type).or_default() += 1;
        }
        summary
    }

    pub fn count(&self, conflict_type: ConflictType) -> usize {
        self.by_type.get(&conflict_type).copied().unwrap_or(0)
    }
}

/// Ordered conflicts plus summary and data-quality warnings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub summary: ConflictSummary,
    pub warnings: Vec<DataWarning>,
}

/// Detect every conflict in a task snapshot.
///
/// Conflicts are ordered by severity (most severe first), then type, then
/// the first affected task id.
pub fn detect_conflicts(
    tasks: &[Task],
    dependencies: &[Dependency],
    allocations: &[ResourceAllocation],
    config: &AnalysisConfig,
) -> ConflictReport {
    let graph = TaskGraph::build(tasks, dependencies);
    let mut warnings = graph.warnings().to_vec();

    let mut conflicts = circular_dependencies(&graph);
    conflicts.extend(timeline_violations(&graph, &mut warnings));
    conflicts.extend(resource_overloads(&graph, allocations, config, &mut warnings));

    sort_conflicts(&mut conflicts);
    dedup_warnings(&mut warnings);
    log_changes!(
        config.verbosity,
        "detected {} conflicts across {} tasks",
        conflicts.len(),
        graph.len()
    );

    ConflictReport {
        summary: ConflictSummary::from_conflicts(&conflicts),
        conflicts,
        warnings,
    }
}

pub(crate) fn sort_conflicts(conflicts: &mut [Conflict]) {
    conflicts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.conflict_type.cmp(&b.conflict_type))
            .then_with(|| a.affected_task_ids.first().cmp(&b.affected_task_ids.first()))
    });
}

/// One conflict per edge whose successor can reach back to its predecessor.
pub fn circular_dependencies(graph: &TaskGraph<'_>) -> Vec<Conflict> {
    graph
        .cyclic_edges()
        .into_iter()
        .map(|edge| {
            let pred = graph.task_id(edge.from);
            let succ = graph.task_id(edge.to);
            Conflict {
                conflict_type: ConflictType::CircularDependency,
                severity: Severity::High,
                message: format!(
                    "Circular dependency: {} depends on {}, which already depends on it",
                    succ, pred
                ),
                affected_task_ids: vec![pred.to_string(), succ.to_string()],
                suggested_resolution: format!(
                    "Remove or reverse the dependency between {} and {}",
                    pred, succ
                ),
                resource_id: None,
                window: None,
                accumulated_allocation: None,
            }
        })
        .collect()
}

/// Date-based precedence checks for every dependency between two dated tasks.
pub fn timeline_violations(
    graph: &TaskGraph<'_>,
    warnings: &mut Vec<DataWarning>,
) -> Vec<Conflict> {
    // Resolve each window once so inverted dates are only reported once
    let windows: Vec<Option<(NaiveDateTime, NaiveDateTime)>> = graph
        .nodes()
        .map(|n| task_window(graph.task(n), graph.duration(n), warnings))
        .collect();

    graph
        .edges()
        .iter()
        .filter_map(|edge| {
            let pred = windows[edge.from as usize]?;
            let succ = windows[edge.to as usize]?;
            timeline_violation(graph, edge, pred, succ, warnings)
        })
        .collect()
}

fn timeline_violation(
    graph: &TaskGraph<'_>,
    edge: &GraphEdge,
    (pred_start, pred_finish): (NaiveDateTime, NaiveDateTime),
    (succ_start, succ_finish): (NaiveDateTime, NaiveDateTime),
    warnings: &mut Vec<DataWarning>,
) -> Option<Conflict> {
    let (anchor, actual, pred_point, succ_point) = match edge.dependency_type {
        DependencyType::FinishToStart => (pred_finish, succ_start, "finish", "start"),
        DependencyType::StartToStart => (pred_start, succ_start, "start", "start"),
        DependencyType::FinishToFinish => (pred_finish, succ_finish, "finish", "finish"),
        DependencyType::StartToFinish => (pred_start, succ_finish, "start", "finish"),
    };
    let required = hours_to_duration(edge.lag).and_then(|lag| anchor.checked_add_signed(lag));
    let Some(required) = required else {
        warnings.push(DataWarning::LagOutOfRange {
            predecessor_id: graph.task_id(edge.from).to_string(),
            successor_id: graph.task_id(edge.to).to_string(),
            value: edge.lag,
        });
        return None;
    };
    if required <= actual {
        return None;
    }

    let pred = graph.task_id(edge.from);
    let succ = graph.task_id(edge.to);
    let overlap = duration_hours(required - actual);
    Some(Conflict {
        conflict_type: ConflictType::TimelineViolation,
        severity: Severity::Medium,
        message: format!(
            "{} must {} after the {} of {} ({}), but is scheduled {:.1}h too early",
            succ,
            succ_point,
            pred_point,
            pred,
            edge.dependency_type.code(),
            overlap
        ),
        affected_task_ids: vec![pred.to_string(), succ.to_string()],
        suggested_resolution: format!(
            "Move the {} of {} to {} or later",
            succ_point,
            succ,
            required.format("%Y-%m-%d %H:%M")
        ),
        resource_id: None,
        window: Some(ConflictWindow {
            start: actual,
            finish: required,
        }),
        accumulated_allocation: None,
    })
}

/// Over-allocation conflicts for every resource timeline.
pub fn resource_overloads(
    graph: &TaskGraph<'_>,
    allocations: &[ResourceAllocation],
    config: &AnalysisConfig,
    warnings: &mut Vec<DataWarning>,
) -> Vec<Conflict> {
    let timelines = build_timelines(graph, allocations, config, warnings);
    let mut conflicts = Vec::new();

    for (resource_id, entries) in &timelines {
        for window in overload_windows(entries) {
            log_checks!(
                config.verbosity,
                "resource {} at {:.0}% from {} to {}",
                resource_id,
                window.peak_allocation,
                window.start,
                window.finish
            );
            conflicts.push(overload_conflict(resource_id, window));
        }
    }
    conflicts
}

fn overload_conflict(resource_id: &str, window: OverloadWindow) -> Conflict {
    let severity = Severity::from_allocation_percent(window.peak_allocation);
    Conflict {
        conflict_type: ConflictType::ResourceOverload,
        severity,
        message: format!(
            "Resource {} is allocated {:.0}% between {} and {} across tasks {}",
            resource_id,
            window.peak_allocation,
            window.start.format("%Y-%m-%d %H:%M"),
            window.finish.format("%Y-%m-%d %H:%M"),
            window.task_ids.join(", ")
        ),
        suggested_resolution: format!(
            "Reschedule one of {} outside the window or reassign part of the work",
            window.task_ids.join(", ")
        ),
        affected_task_ids: window.task_ids,
        resource_id: Some(resource_id.to_string()),
        window: Some(ConflictWindow {
            start: window.start,
            finish: window.finish,
        }),
        accumulated_allocation: Some(window.peak_allocation),
    }
}
