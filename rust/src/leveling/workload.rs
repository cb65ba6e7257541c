//! Daily workload distribution, peak periods and workload balance.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::conflicts::build_timelines;
use crate::graph::TaskGraph;
use crate::log_checks;
use crate::models::{dedup_warnings, DataWarning, Resource, ResourceAllocation, Task};

use super::utilization::{daily_hours, project_span_days, resource_catalog};

/// Hours a resource works on one calendar day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub hours: f64,
}

/// Consecutive days sharing a load condition (inclusive dates).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Highest single-day load inside the period.
    pub peak_hours: f64,
}

/// Workload of a single resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceWorkload {
    pub resource_id: String,
    pub name: String,
    pub daily_capacity: f64,
    /// Days with any work, ascending.
    pub daily: Vec<DailyLoad>,
    pub total_hours: f64,
    /// total_hours spread over the project span.
    pub average_daily_hours: f64,
    pub utilization_percent: f64,
    /// Days above daily capacity.
    pub peak_days: Vec<NaiveDate>,
    /// Days with some work but less than half of daily capacity.
    pub underutilized_days: Vec<NaiveDate>,
    /// Consecutive peak days merged into periods.
    pub peak_periods: Vec<WorkPeriod>,
    pub underutilized_periods: Vec<WorkPeriod>,
}

/// A resource whose average daily load exceeds its capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub resource_id: String,
    pub name: String,
    pub average_daily_hours: f64,
    pub utilization_percent: f64,
}

/// Workload analytics across all resources.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadReport {
    pub resources: Vec<ResourceWorkload>,
    pub span_days: i64,
    /// 0-100, 100 when every resource carries the same total hours.
    pub balance_score: f64,
    /// Ranked by utilization, highest first.
    pub bottlenecks: Vec<Bottleneck>,
    pub warnings: Vec<DataWarning>,
}

/// Merge days into periods of consecutive dates.
///
/// `days` must be sorted ascending; each day carries its hours.
fn merge_days(days: &[(NaiveDate, f64)]) -> Vec<WorkPeriod> {
    let mut merged: Vec<WorkPeriod> = Vec::new();
    for &(day, hours) in days {
        match merged.last_mut() {
            Some(last) if last.end.checked_add_days(Days::new(1)) == Some(day) => {
                last.end = day;
                last.peak_hours = last.peak_hours.max(hours);
            }
            _ => merged.push(WorkPeriod {
                start: day,
                end: day,
                peak_hours: hours,
            }),
        }
    }
    merged
}

/// Balance score from per-resource totals: max(0, 100 - CV x 100).
///
/// CV is the population coefficient of variation; a zero mean counts as
/// perfectly balanced.
pub fn workload_balance_score(totals: &[f64]) -> f64 {
    if totals.is_empty() {
        return 100.0;
    }
    let n = totals.len() as f64;
    let mean = totals.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 100.0;
    }
    let variance = totals.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;
    (100.0 - cv * 100.0).max(0.0)
}

/// Per-resource, per-day workload with peak and underutilized periods.
pub fn analyze_workload(
    tasks: &[Task],
    resources: &[Resource],
    allocations: &[ResourceAllocation],
    config: &AnalysisConfig,
) -> WorkloadReport {
    let graph = TaskGraph::build(tasks, &[]);
    let mut warnings = graph.warnings().to_vec();
    let timelines = build_timelines(&graph, allocations, config, &mut warnings);
    let span_days = project_span_days(&graph, &mut warnings);
    let catalog = resource_catalog(resources, &timelines, &mut warnings);
    let per_day = daily_hours(&timelines);

    let mut workloads = Vec::with_capacity(catalog.len());
    for resource in catalog.values() {
        let daily_capacity = config.daily_capacity(resource.weekly_capacity_hours);
        let days: Vec<(NaiveDate, f64)> = per_day
            .get(&resource.id)
            .map(|d| d.iter().map(|(&day, &hours)| (day, hours)).collect())
            .unwrap_or_default();

        let total_hours: f64 = days.iter().map(|&(_, h)| h).sum();
        let average_daily_hours = if span_days > 0 {
            total_hours / span_days as f64
        } else {
            0.0
        };

        let peaks: Vec<(NaiveDate, f64)> = days
            .iter()
            .copied()
            .filter(|&(_, h)| h > daily_capacity + 1e-9)
            .collect();
        let light: Vec<(NaiveDate, f64)> = days
            .iter()
            .copied()
            .filter(|&(_, h)| h > 0.0 && h < daily_capacity / 2.0)
            .collect();

        log_checks!(
            config.verbosity,
            "resource {}: {:.1}h total, {} peak days",
            resource.id,
            total_hours,
            peaks.len()
        );

        workloads.push(ResourceWorkload {
            resource_id: resource.id.clone(),
            name: resource.name.clone(),
            daily_capacity,
            daily: days
                .iter()
                .map(|&(date, hours)| DailyLoad { date, hours })
                .collect(),
            total_hours,
            average_daily_hours,
            utilization_percent: if daily_capacity > 0.0 {
                average_daily_hours / daily_capacity * 100.0
            } else {
                0.0
            },
            peak_days: peaks.iter().map(|&(day, _)| day).collect(),
            underutilized_days: light.iter().map(|&(day, _)| day).collect(),
            peak_periods: merge_days(&peaks),
            underutilized_periods: merge_days(&light),
        });
    }

    let totals: Vec<f64> = workloads.iter().map(|w| w.total_hours).collect();
    let mut bottlenecks: Vec<Bottleneck> = workloads
        .iter()
        .filter(|w| w.average_daily_hours > w.daily_capacity + 1e-9)
        .map(|w| Bottleneck {
            resource_id: w.resource_id.clone(),
            name: w.name.clone(),
            average_daily_hours: w.average_daily_hours,
            utilization_percent: w.utilization_percent,
        })
        .collect();
    bottlenecks.sort_by(|a, b| {
        b.utilization_percent
            .total_cmp(&a.utilization_percent)
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });

    dedup_warnings(&mut warnings);
    WorkloadReport {
        resources: workloads,
        span_days,
        balance_score: workload_balance_score(&totals),
        bottlenecks,
        warnings,
    }
}
