//! Per-resource allocation timelines and overload windows.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::graph::TaskGraph;
use crate::models::{task_window, DataWarning, ResourceAllocation};

/// One task occupying a resource for a window at a given allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationEntry {
    pub task_id: String,
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub allocation_percent: f64,
    /// Sanitized task duration in hours.
    pub duration: f64,
}

/// A contiguous stretch where a resource's concurrent allocation exceeds 100%.
#[derive(Clone, Debug, PartialEq)]
pub struct OverloadWindow {
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    /// Tasks active at any point of the window, in first-seen order.
    pub task_ids: Vec<String>,
    /// Highest concurrent allocation seen inside the window.
    pub peak_allocation: f64,
}

/// Allocation entries keyed by resource id.
pub type AllocationTimelines = BTreeMap<String, Vec<AllocationEntry>>;

/// Build every resource's allocation timeline from dated tasks.
///
/// A task contributes to each of its assignees plus every resource with an
/// explicit allocation on it; assignees without one get the default share.
/// Undated tasks are skipped.
pub fn build_timelines(
    graph: &TaskGraph<'_>,
    allocations: &[ResourceAllocation],
    config: &AnalysisConfig,
    warnings: &mut Vec<DataWarning>,
) -> AllocationTimelines {
    let mut explicit: FxHashMap<&str, Vec<(&str, f64)>> = FxHashMap::default();
    for alloc in allocations {
        let percent = if alloc.allocation_percent.is_finite() {
            alloc.allocation_percent.max(0.0)
        } else {
            0.0
        };
        explicit
            .entry(alloc.task_id.as_str())
            .or_default()
            .push((alloc.resource_id.as_str(), percent));
    }

    let mut timelines = AllocationTimelines::new();
    for node in graph.nodes() {
        let task = graph.task(node);
        let duration = graph.duration(node);
        let Some((start, finish)) = task_window(task, duration, warnings) else {
            continue;
        };

        let mut shares: BTreeMap<&str, f64> = task
            .assignee_ids
            .iter()
            .map(|r| (r.as_str(), config.default_allocation_percent))
            .collect();
        if let Some(list) = explicit.get(task.id.as_str()) {
            for &(resource_id, percent) in list {
                shares.insert(resource_id, percent);
            }
        }

        for (resource_id, percent) in shares {
            timelines
                .entry(resource_id.to_string())
                .or_default()
                .push(AllocationEntry {
                    task_id: task.id.clone(),
                    start,
                    finish,
                    allocation_percent: percent,
                    duration,
                });
        }
    }

    for entries in timelines.values_mut() {
        entries.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.task_id.cmp(&b.task_id)));
    }
    timelines
}

/// Sweep a timeline and return the windows where total allocation exceeds 100%.
///
/// Adjacent over-allocated segments are merged into a single window. Tasks
/// that merely touch (one finishes when the other starts) do not overlap.
pub fn overload_windows(entries: &[AllocationEntry]) -> Vec<OverloadWindow> {
    let mut points: Vec<NaiveDateTime> = entries
        .iter()
        .flat_map(|e| [e.start, e.finish])
        .collect();
    points.sort_unstable();
    points.dedup();

    let mut windows: Vec<OverloadWindow> = Vec::new();
    let mut open: Option<OverloadWindow> = None;

    for segment in points.windows(2) {
        let (seg_start, seg_end) = (segment[0], segment[1]);
        let active: Vec<&AllocationEntry> = entries
            .iter()
            .filter(|e| e.start <= seg_start && e.finish >= seg_end)
            .collect();
        let load: f64 = active.iter().map(|e| e.allocation_percent).sum();

        if load > 100.0 + 1e-9 {
            match open.as_mut() {
                Some(window) if window.finish == seg_start => {
                    window.finish = seg_end;
                    window.peak_allocation = window.peak_allocation.max(load);
                    for entry in &active {
                        if !window.task_ids.contains(&entry.task_id) {
                            window.task_ids.push(entry.task_id.clone());
                        }
                    }
                }
                _ => {
                    windows.extend(open.take());
                    open = Some(OverloadWindow {
                        start: seg_start,
                        finish: seg_end,
                        task_ids: active.iter().map(|e| e.task_id.clone()).collect(),
                        peak_allocation: load,
                    });
                }
            }
        } else {
            windows.extend(open.take());
        }
    }
    windows.extend(open);
    windows
}
