//! Resource utilization over the project's calendar span and the resource
//! health score.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::conflicts::{build_timelines, resource_overloads, AllocationTimelines};
use crate::graph::TaskGraph;
use crate::models::{
    dedup_warnings, task_window, DataWarning, Resource, ResourceAllocation, Task,
};

/// Utilization band of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationStatus {
    Underutilized,
    Optimal,
    High,
    OverAllocated,
    CriticallyOverAllocated,
}

impl UtilizationStatus {
    pub fn from_percent(percent: f64) -> Self {
        if percent < 50.0 {
            Self::Underutilized
        } else if percent < 80.0 {
            Self::Optimal
        } else if percent < 100.0 {
            Self::High
        } else if percent < 150.0 {
            Self::OverAllocated
        } else {
            Self::CriticallyOverAllocated
        }
    }

    pub fn is_over_allocated(self) -> bool {
        matches!(self, Self::OverAllocated | Self::CriticallyOverAllocated)
    }
}

/// Allocated hours of one resource against its capacity over the project span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceUtilization {
    pub resource_id: String,
    pub name: String,
    pub allocated_hours: f64,
    pub capacity_hours: f64,
    pub utilization_percent: f64,
    pub status: UtilizationStatus,
    pub task_count: usize,
}

/// Utilization of every resource plus the aggregate health score.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUtilizationReport {
    pub resources: Vec<ResourceUtilization>,
    pub span_days: i64,
    pub average_utilization: f64,
    pub over_allocated_count: usize,
    pub conflict_count: usize,
    /// 0-100, higher is healthier.
    pub health_score: f64,
    pub warnings: Vec<DataWarning>,
}

/// First calendar day a window touches and how many days it covers.
///
/// A window ending exactly at midnight does not touch the day it ends on.
pub(crate) fn covered_days(start: NaiveDateTime, finish: NaiveDateTime) -> (NaiveDate, i64) {
    let first = start.date();
    let mut last = finish.date();
    if finish > start && finish.time() == NaiveTime::MIN {
        last = last.checked_sub_days(Days::new(1)).unwrap_or(last);
    }
    let count = ((last - first).num_days() + 1).max(1);
    (first, count)
}

/// Number of calendar days between the earliest dated start and latest dated finish.
pub(crate) fn project_span_days(graph: &TaskGraph<'_>, warnings: &mut Vec<DataWarning>) -> i64 {
    let mut bounds: Option<(NaiveDateTime, NaiveDateTime)> = None;
    for node in graph.nodes() {
        if let Some((start, finish)) = task_window(graph.task(node), graph.duration(node), warnings)
        {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(start), hi.max(finish)),
                None => (start, finish),
            });
        }
    }
    bounds.map(|(lo, hi)| covered_days(lo, hi).1).unwrap_or(0)
}

/// Hours worked per resource per day, spreading each task evenly over its days.
pub(crate) fn daily_hours(
    timelines: &AllocationTimelines,
) -> BTreeMap<String, BTreeMap<NaiveDate, f64>> {
    let mut result: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for (resource_id, entries) in timelines {
        let days = result.entry(resource_id.clone()).or_default();
        for entry in entries {
            let hours = entry.duration * entry.allocation_percent / 100.0;
            let (first, count) = covered_days(entry.start, entry.finish);
            let per_day = hours / count as f64;
            for offset in 0..count {
                if let Some(day) = first.checked_add_days(Days::new(offset as u64)) {
                    *days.entry(day).or_default() += per_day;
                }
            }
        }
    }
    result
}

/// Known resources plus any resource referenced only by tasks.
///
/// Resources missing from the list get default capacity and a warning.
/// Unusable capacities are zeroed so `daily_capacity` falls back to a workday.
pub(crate) fn resource_catalog(
    resources: &[Resource],
    timelines: &AllocationTimelines,
    warnings: &mut Vec<DataWarning>,
) -> BTreeMap<String, Resource> {
    let mut catalog: BTreeMap<String, Resource> = BTreeMap::new();
    for resource in resources {
        let mut resource = resource.clone();
        let capacity = resource.weekly_capacity_hours;
        if !capacity.is_finite() || capacity <= 0.0 {
            warnings.push(DataWarning::InvalidCapacity {
                resource_id: resource.id.clone(),
                value: capacity,
            });
            resource.weekly_capacity_hours = 0.0;
        }
        catalog.insert(resource.id.clone(), resource);
    }
    for resource_id in timelines.keys() {
        if !catalog.contains_key(resource_id) {
            warnings.push(DataWarning::UnknownResource {
                resource_id: resource_id.clone(),
            });
            catalog.insert(
                resource_id.clone(),
                Resource::new(resource_id.clone(), resource_id.clone()),
            );
        }
    }
    catalog
}

/// Resource health score, clamped to 0-100.
///
/// 0.4 x (100 - 5 x conflicts) + 0.3 x (100 - 10 x over-allocated resources)
/// + 0.3 x (100 - |average utilization - 80|)
pub fn resource_health_score(
    conflict_count: usize,
    over_allocated_count: usize,
    average_utilization: f64,
) -> f64 {
    let conflict_term = 100.0 - 5.0 * conflict_count as f64;
    let allocation_term = 100.0 - 10.0 * over_allocated_count as f64;
    let utilization_term = 100.0 - (average_utilization - 80.0).abs();
    (0.4 * conflict_term + 0.3 * allocation_term + 0.3 * utilization_term).clamp(0.0, 100.0)
}

/// Utilization of every resource over the project span.
pub fn analyze_resource_utilization(
    tasks: &[Task],
    resources: &[Resource],
    allocations: &[ResourceAllocation],
    config: &AnalysisConfig,
) -> ResourceUtilizationReport {
    let graph = TaskGraph::build(tasks, &[]);
    let mut warnings = graph.warnings().to_vec();
    let timelines = build_timelines(&graph, allocations, config, &mut warnings);
    let conflict_count = resource_overloads(&graph, allocations, config, &mut warnings).len();
    let mut report = utilization_report(
        &graph,
        &timelines,
        resources,
        conflict_count,
        config,
        warnings,
    );
    dedup_warnings(&mut report.warnings);
    report
}

pub(crate) fn utilization_report(
    graph: &TaskGraph<'_>,
    timelines: &AllocationTimelines,
    resources: &[Resource],
    conflict_count: usize,
    config: &AnalysisConfig,
    mut warnings: Vec<DataWarning>,
) -> ResourceUtilizationReport {
    let span_days = project_span_days(graph, &mut warnings);
    let catalog = resource_catalog(resources, timelines, &mut warnings);

    let rows: Vec<ResourceUtilization> = catalog
        .values()
        .map(|resource| {
            let entries = timelines.get(&resource.id).map(Vec::as_slice).unwrap_or(&[]);
            let allocated_hours: f64 = entries
                .iter()
                .map(|e| e.duration * e.allocation_percent / 100.0)
                .sum();
            let capacity_hours =
                span_days as f64 * config.daily_capacity(resource.weekly_capacity_hours);
            let utilization_percent = if capacity_hours > 0.0 {
                allocated_hours / capacity_hours * 100.0
            } else {
                0.0
            };
            ResourceUtilization {
                resource_id: resource.id.clone(),
                name: resource.name.clone(),
                allocated_hours,
                capacity_hours,
                utilization_percent,
                status: UtilizationStatus::from_percent(utilization_percent),
                task_count: entries.len(),
            }
        })
        .collect();

    let average_utilization = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|r| r.utilization_percent).sum::<f64>() / rows.len() as f64
    };
    let over_allocated_count = rows.iter().filter(|r| r.status.is_over_allocated()).count();

    let health_score =
        resource_health_score(conflict_count, over_allocated_count, average_utilization);

    ResourceUtilizationReport {
        resources: rows,
        span_days,
        average_utilization,
        over_allocated_count,
        conflict_count,
        health_score,
        warnings,
    }
}
