//! Plan-vs-actual variance of a current task snapshot against a baseline.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{
    dedup_warnings, duration_hours, sanitize_cost, sanitize_duration, sanitize_percent,
    DataWarning, Severity, Task,
};

use super::evm::{earned_value, EvmMetrics, Progress};
use super::snapshot::{Baseline, TaskSnapshot};

const EPSILON: f64 = 1e-9;

/// How a task changed relative to the baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Unchanged,
    Modified,
    Added,
    Deleted,
}

/// Variance of one task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskVariance {
    pub task_id: String,
    pub name: String,
    pub change: ChangeKind,
    pub baseline_duration: f64,
    pub current_duration: f64,
    /// current - baseline, in hours.
    pub schedule_variance_hours: f64,
    pub schedule_variance_percent: f64,
    /// Start slip in days, when both starts are known.
    pub start_variance_days: Option<f64>,
    pub finish_variance_days: Option<f64>,
    pub baseline_cost: f64,
    pub current_cost: f64,
    pub cost_variance: f64,
    pub cost_variance_percent: f64,
    pub severity: Severity,
}

/// Aggregate variance over the whole project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarianceSummary {
    pub baseline_duration: f64,
    pub current_duration: f64,
    pub schedule_variance_hours: f64,
    pub schedule_variance_percent: f64,
    pub baseline_cost: f64,
    pub current_cost: f64,
    pub cost_variance: f64,
    pub cost_variance_percent: f64,
    pub severity: Severity,
    pub by_severity: BTreeMap<Severity, usize>,
    pub modified_count: usize,
    pub added_count: usize,
    pub deleted_count: usize,
}

/// Variance of a current snapshot against a baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub baseline_id: Uuid,
    /// Baseline tasks in baseline order, then added tasks in input order.
    pub records: Vec<TaskVariance>,
    pub summary: VarianceSummary,
    pub evm: EvmMetrics,
    pub warnings: Vec<DataWarning>,
}

/// `delta` as a percentage of `base`; 0 when `base` is 0.
pub(crate) fn percent_of(delta: f64, base: f64) -> f64 {
    if base.abs() < EPSILON {
        0.0
    } else {
        delta / base * 100.0
    }
}

fn days_between(baseline: Option<NaiveDateTime>, current: Option<NaiveDateTime>) -> Option<f64> {
    Some(duration_hours(current? - baseline?) / 24.0)
}

/// Values of a current task used for comparison.
struct CurrentValues<'t> {
    task: &'t Task,
    duration: f64,
    cost: f64,
}

/// Current cost: actual cost once reported, else the estimate.
fn current_cost(task: &Task, warnings: &mut Vec<DataWarning>) -> f64 {
    let actual = sanitize_cost(&task.id, "actual_cost", task.actual_cost, warnings);
    if actual > 0.0 {
        actual
    } else {
        sanitize_cost(&task.id, "estimated_cost", task.estimated_cost, warnings)
    }
}

fn compare_task(snapshot: &TaskSnapshot, current: &CurrentValues<'_>) -> TaskVariance {
    let task = current.task;
    let schedule_variance_hours = current.duration - snapshot.duration;
    let cost_variance = current.cost - snapshot.cost;
    let schedule_variance_percent = percent_of(schedule_variance_hours, snapshot.duration);
    let cost_variance_percent = percent_of(cost_variance, snapshot.cost);

    let start_variance_days = days_between(snapshot.start_date, task.start_date);
    let finish_variance_days = days_between(snapshot.finish_date, task.finish_date);
    let changed = schedule_variance_hours.abs() > EPSILON
        || cost_variance.abs() > EPSILON
        || snapshot.start_date != task.start_date
        || snapshot.finish_date != task.finish_date;

    TaskVariance {
        task_id: snapshot.task_id.clone(),
        name: task.name.clone(),
        change: if changed {
            ChangeKind::Modified
        } else {
            ChangeKind::Unchanged
        },
        baseline_duration: snapshot.duration,
        current_duration: current.duration,
        schedule_variance_hours,
        schedule_variance_percent,
        start_variance_days,
        finish_variance_days,
        baseline_cost: snapshot.cost,
        current_cost: current.cost,
        cost_variance,
        cost_variance_percent,
        severity: Severity::from_variance_percent(
            schedule_variance_percent
                .abs()
                .max(cost_variance_percent.abs()),
        ),
    }
}

fn scope_change(
    task_id: &str,
    name: &str,
    change: ChangeKind,
    baseline: (f64, f64),
    current: (f64, f64),
) -> TaskVariance {
    let (baseline_duration, baseline_cost) = baseline;
    let (current_duration, current_cost) = current;
    TaskVariance {
        task_id: task_id.to_string(),
        name: name.to_string(),
        change,
        baseline_duration,
        current_duration,
        schedule_variance_hours: current_duration - baseline_duration,
        schedule_variance_percent: 0.0,
        start_variance_days: None,
        finish_variance_days: None,
        baseline_cost,
        current_cost,
        cost_variance: current_cost - baseline_cost,
        cost_variance_percent: 0.0,
        severity: Severity::Medium,
    }
}

fn summarize(records: &[TaskVariance]) -> VarianceSummary {
    let baseline_duration: f64 = records.iter().map(|r| r.baseline_duration).sum();
    let current_duration: f64 = records.iter().map(|r| r.current_duration).sum();
    let baseline_cost: f64 = records.iter().map(|r| r.baseline_cost).sum();
    let current_cost: f64 = records.iter().map(|r| r.current_cost).sum();
    let schedule_variance_hours = current_duration - baseline_duration;
    let cost_variance = current_cost - baseline_cost;
    let schedule_variance_percent = percent_of(schedule_variance_hours, baseline_duration);
    let cost_variance_percent = percent_of(cost_variance, baseline_cost);

    let mut by_severity = BTreeMap::new();
    for record in records {
        *by_severity.entry(record.severity).or_default() += 1;
    }
    let count = |kind: ChangeKind| records.iter().filter(|r| r.change == kind).count();

    VarianceSummary {
        baseline_duration,
        current_duration,
        schedule_variance_hours,
        schedule_variance_percent,
        baseline_cost,
        current_cost,
        cost_variance,
        cost_variance_percent,
        severity: Severity::from_variance_percent(
            schedule_variance_percent
                .abs()
                .max(cost_variance_percent.abs()),
        ),
        by_severity,
        modified_count: count(ChangeKind::Modified),
        added_count: count(ChangeKind::Added),
        deleted_count: count(ChangeKind::Deleted),
    }
}

/// Compare the current task snapshot against a baseline.
///
/// Baseline tasks absent from `current` are reported deleted; current tasks
/// absent from the baseline are reported added. Both are scope changes of
/// medium severity.
pub fn analyze_variance(baseline: &Baseline, current: &[Task]) -> VarianceReport {
    let mut warnings = Vec::new();
    let mut by_id: FxHashMap<&str, CurrentValues<'_>> = FxHashMap::default();
    let mut progress: FxHashMap<&str, Progress> = FxHashMap::default();
    let mut current_order: Vec<&str> = Vec::with_capacity(current.len());

    for task in current {
        if by_id.contains_key(task.id.as_str()) {
            warnings.push(DataWarning::DuplicateTask {
                task_id: task.id.clone(),
            });
            continue;
        }
        let duration = sanitize_duration(task, &mut warnings);
        let cost = current_cost(task, &mut warnings);
        let actual_cost = sanitize_cost(&task.id, "actual_cost", task.actual_cost, &mut warnings);
        progress.insert(
            task.id.as_str(),
            Progress {
                percent_complete: sanitize_percent(task, &mut warnings),
                actual_cost,
            },
        );
        by_id.insert(
            task.id.as_str(),
            CurrentValues {
                task,
                duration,
                cost,
            },
        );
        current_order.push(task.id.as_str());
    }

    let mut records = Vec::with_capacity(baseline.tasks().len() + current.len());
    for snapshot in baseline.tasks() {
        let record = match by_id.get(snapshot.task_id.as_str()) {
            Some(values) => compare_task(snapshot, values),
            None => scope_change(
                &snapshot.task_id,
                &snapshot.name,
                ChangeKind::Deleted,
                (snapshot.duration, snapshot.cost),
                (0.0, 0.0),
            ),
        };
        records.push(record);
    }
    let baselined = baseline.index();
    for id in current_order {
        if baselined.contains_key(id) {
            continue;
        }
        if let Some(values) = by_id.get(id) {
            records.push(scope_change(
                id,
                &values.task.name,
                ChangeKind::Added,
                (0.0, 0.0),
                (values.duration, values.cost),
            ));
        }
    }

    dedup_warnings(&mut warnings);
    VarianceReport {
        baseline_id: baseline.id(),
        summary: summarize(&records),
        evm: earned_value(baseline, &progress),
        records,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{create_baseline, EvmStatus};
    use crate::models::test_support::at;

    fn make_task(id: &str, duration: f64) -> Task {
        Task::new(id, id.to_uppercase(), duration)
    }

    #[test]
    fn test_duration_growth_is_high_severity() {
        let planned = vec![make_task("a", 100.0)];
        let baseline = create_baseline("p1", "v1", &planned, &[], at(5, 0)).unwrap();
        let report = analyze_variance(&baseline, &[make_task("a", 120.0)]);

        let record = &report.records[0];
        assert_eq!(record.change, ChangeKind::Modified);
        assert_eq!(record.schedule_variance_hours, 20.0);
        assert_eq!(record.schedule_variance_percent, 20.0);
        assert_eq!(record.severity, Severity::High);

        assert_eq!(report.summary.schedule_variance_hours, 20.0);
        assert_eq!(report.summary.schedule_variance_percent, 20.0);
        assert_eq!(report.summary.severity, Severity::High);
    }

    #[test]
    fn test_project_level_variance_over_several_tasks() {
        let planned = vec![make_task("a", 60.0), make_task("b", 40.0)];
        let baseline = create_baseline("p1", "v1", &planned, &[], at(5, 0)).unwrap();
        let report = analyze_variance(&baseline, &[make_task("a", 70.0), make_task("b", 50.0)]);

        assert_eq!(report.summary.baseline_duration, 100.0);
        assert_eq!(report.summary.current_duration, 120.0);
        assert_eq!(report.summary.schedule_variance_percent, 20.0);
        assert_eq!(report.summary.severity, Severity::High);
        assert_eq!(report.summary.modified_count, 2);
    }

    #[test]
    fn test_added_and_deleted_tasks() {
        let planned = vec![make_task("a", 8.0), make_task("b", 8.0)];
        let baseline = create_baseline("p1", "v1", &planned, &[], at(5, 0)).unwrap();
        let report = analyze_variance(&baseline, &[make_task("a", 8.0), make_task("c", 4.0)]);

        let changes: Vec<(&str, ChangeKind)> = report
            .records
            .iter()
            .map(|r| (r.task_id.as_str(), r.change))
            .collect();
        assert_eq!(
            changes,
            vec![
                ("a", ChangeKind::Unchanged),
                ("b", ChangeKind::Deleted),
                ("c", ChangeKind::Added),
            ]
        );
        assert_eq!(report.records[1].severity, Severity::Medium);
        assert_eq!(report.records[2].severity, Severity::Medium);
        assert_eq!(report.records[2].current_duration, 4.0);
        assert_eq!(report.summary.added_count, 1);
        assert_eq!(report.summary.deleted_count, 1);
        assert_eq!(report.summary.by_severity[&Severity::Low], 1);
        assert_eq!(report.summary.by_severity[&Severity::Medium], 2);
    }

    #[test]
    fn test_date_slip_in_days() {
        let planned = vec![make_task("a", 8.0).with_dates(at(6, 9), at(6, 17))];
        let baseline = create_baseline("p1", "v1", &planned, &[], at(5, 0)).unwrap();
        let current = vec![make_task("a", 8.0).with_dates(at(8, 9), at(8, 21))];
        let record = &analyze_variance(&baseline, &current).records[0];

        assert_eq!(record.change, ChangeKind::Modified);
        assert_eq!(record.start_variance_days, Some(2.0));
        let finish_slip = record.finish_variance_days.unwrap();
        assert!((finish_slip - 52.0 / 24.0).abs() < 1e-9);
        // Duration and cost unchanged keep severity low
        assert_eq!(record.severity, Severity::Low);
    }

    #[test]
    fn test_fully_complete_on_budget_is_excellent() {
        let planned = vec![
            make_task("a", 8.0).with_costs(Some(500.0), None),
            make_task("b", 16.0).with_costs(Some(1500.0), None),
        ];
        let baseline = create_baseline("p1", "v1", &planned, &[], at(5, 0)).unwrap();
        let current = vec![
            make_task("a", 8.0)
                .with_costs(Some(500.0), Some(500.0))
                .with_progress(100.0),
            make_task("b", 16.0)
                .with_costs(Some(1500.0), Some(1500.0))
                .with_progress(100.0),
        ];
        let report = analyze_variance(&baseline, &current);

        assert_eq!(report.evm.schedule_performance_index, 1.0);
        assert_eq!(report.evm.cost_performance_index, 1.0);
        assert_eq!(report.evm.schedule_variance, 0.0);
        assert_eq!(report.evm.cost_variance, 0.0);
        assert_eq!(report.evm.status, EvmStatus::Excellent);
        assert_eq!(report.summary.cost_variance, 0.0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_zero_baseline_values_do_not_divide() {
        let planned = vec![make_task("a", 0.0)];
        let baseline = create_baseline("p1", "v1", &planned, &[], at(5, 0)).unwrap();
        let report = analyze_variance(&baseline, &[make_task("a", 8.0).with_progress(140.0)]);

        assert_eq!(report.records[0].schedule_variance_percent, 0.0);
        assert!(report.summary.schedule_variance_percent.is_finite());
        assert_eq!(report.warnings.len(), 1);
    }
}
