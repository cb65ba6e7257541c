//! Reschedule proposals that resolve resource over-allocation.

use chrono::{Days, NaiveDateTime};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::conflicts::{build_timelines, resource_overloads, sort_conflicts, Conflict};
use crate::critical_path::CriticalPathResult;
use crate::graph::TaskGraph;
use crate::models::{
    dedup_warnings, duration_hours, task_window, DataWarning, Resource, ResourceAllocation,
    RiskLevel, Task,
};
use crate::{log_changes, log_debug};

use super::utilization::{utilization_report, ResourceUtilizationReport};

/// Proposed move of one task out of an overload window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelingProposal {
    pub task_id: String,
    /// Resource whose overload the move resolves.
    pub resource_id: String,
    pub current_start: NaiveDateTime,
    pub current_finish: NaiveDateTime,
    pub proposed_start: NaiveDateTime,
    pub proposed_finish: NaiveDateTime,
    pub shift_hours: f64,
    pub reason: String,
    /// Low when the task's total float covers the shift.
    pub risk: RiskLevel,
    pub preserves_critical_path: bool,
}

/// Output of resource leveling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelingPlan {
    /// At most one proposal per task, ordered by current start.
    pub proposals: Vec<LevelingProposal>,
    /// Overload conflicts the proposals address.
    pub conflicts: Vec<Conflict>,
    pub utilization: ResourceUtilizationReport,
    pub health_score: f64,
    pub warnings: Vec<DataWarning>,
}

struct Candidate<'t> {
    task: &'t Task,
    duration: f64,
    total_float: Option<f64>,
    window: (NaiveDateTime, NaiveDateTime),
}

/// Task to move out of a conflict: greatest float, then shortest duration, then id.
///
/// Without float data the float criterion is skipped.
fn pick_candidate<'c, 't>(candidates: &'c [Candidate<'t>]) -> Option<&'c Candidate<'t>> {
    candidates.iter().min_by(|a, b| {
        let by_float = match (a.total_float, b.total_float) {
            (Some(fa), Some(fb)) => fb.total_cmp(&fa),
            _ => std::cmp::Ordering::Equal,
        };
        by_float
            .then_with(|| a.duration.total_cmp(&b.duration))
            .then_with(|| a.task.id.cmp(&b.task.id))
    })
}

/// Keep the proposal with the larger shift when a task is selected twice.
fn keep_largest_shift(
    proposals: &mut BTreeMap<String, LevelingProposal>,
    proposal: LevelingProposal,
) {
    match proposals.get(&proposal.task_id) {
        Some(existing) if existing.shift_hours >= proposal.shift_hours => {}
        _ => {
            proposals.insert(proposal.task_id.clone(), proposal);
        }
    }
}

/// Propose reschedules resolving every resource overload.
///
/// `floats` is an optional critical path result for the same snapshot; when
/// absent the shortest conflicting task is moved and every proposal carries
/// medium risk.
pub fn level_resources(
    tasks: &[Task],
    resources: &[Resource],
    allocations: &[ResourceAllocation],
    floats: Option<&CriticalPathResult>,
    config: &AnalysisConfig,
) -> LevelingPlan {
    let graph = TaskGraph::build(tasks, &[]);
    let mut warnings = graph.warnings().to_vec();
    let timelines = build_timelines(&graph, allocations, config, &mut warnings);
    let mut conflicts = resource_overloads(&graph, allocations, config, &mut warnings);
    sort_conflicts(&mut conflicts);

    let float_by_id: FxHashMap<&str, f64> = floats
        .map(|r| {
            r.records
                .iter()
                .map(|rec| (rec.task_id.as_str(), rec.total_float))
                .collect()
        })
        .unwrap_or_default();

    let mut proposals: BTreeMap<String, LevelingProposal> = BTreeMap::new();
    for conflict in &conflicts {
        let (Some(resource_id), Some(window)) = (&conflict.resource_id, &conflict.window) else {
            continue;
        };

        let candidates: Vec<Candidate<'_>> = conflict
            .affected_task_ids
            .iter()
            .filter_map(|id| {
                let node = graph.node(id)?;
                let task = graph.task(node);
                let duration = graph.duration(node);
                let span = task_window(task, duration, &mut warnings)?;
                // A task missing from the float data has no slack to spend
                let total_float =
                    floats.map(|_| float_by_id.get(id.as_str()).copied().unwrap_or(0.0));
                Some(Candidate {
                    task,
                    duration,
                    total_float,
                    window: span,
                })
            })
            .collect();

        let Some(chosen) = pick_candidate(&candidates) else {
            continue;
        };

        let (current_start, current_finish) = chosen.window;
        let moved = window.finish.checked_add_days(Days::new(1)).and_then(|start| {
            let finish = start.checked_add_signed(current_finish - current_start)?;
            Some((start, finish))
        });
        let Some((proposed_start, proposed_finish)) = moved else {
            warnings.push(DataWarning::DateOutOfRange {
                task_id: chosen.task.id.clone(),
            });
            continue;
        };
        let shift_hours = duration_hours(proposed_start - current_start);
        let float_covers_shift = chosen
            .total_float
            .is_some_and(|f| f + config.critical_epsilon >= shift_hours);
        let risk = if float_covers_shift {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        log_debug!(
            config.verbosity,
            "moving {} by {:.1}h to clear {} ({:?} risk)",
            chosen.task.id,
            shift_hours,
            resource_id,
            risk
        );

        keep_largest_shift(
            &mut proposals,
            LevelingProposal {
                task_id: chosen.task.id.clone(),
                resource_id: resource_id.clone(),
                current_start,
                current_finish,
                proposed_start,
                proposed_finish,
                shift_hours,
                reason: format!(
                    "Resolves {:.0}% allocation of {} ending {}",
                    conflict.accumulated_allocation.unwrap_or(0.0),
                    resource_id,
                    window.finish.format("%Y-%m-%d %H:%M")
                ),
                risk,
                preserves_critical_path: float_covers_shift,
            },
        );
    }

    let mut proposals: Vec<LevelingProposal> = proposals.into_values().collect();
    proposals.sort_by(|a, b| {
        a.current_start
            .cmp(&b.current_start)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });
    log_changes!(
        config.verbosity,
        "{} leveling proposals for {} overloads",
        proposals.len(),
        conflicts.len()
    );

    let mut utilization = utilization_report(
        &graph,
        &timelines,
        resources,
        conflicts.len(),
        config,
        warnings,
    );
    dedup_warnings(&mut utilization.warnings);

    LevelingPlan {
        proposals,
        health_score: utilization.health_score,
        warnings: utilization.warnings.clone(),
        conflicts,
        utilization,
    }
}

/// New task snapshot with every proposal's dates applied.
///
/// Durations are untouched; proposals for unknown tasks are ignored.
pub fn apply_leveling(tasks: &[Task], proposals: &[LevelingProposal]) -> Vec<Task> {
    let by_task: FxHashMap<&str, &LevelingProposal> = proposals
        .iter()
        .map(|p| (p.task_id.as_str(), p))
        .collect();

    tasks
        .iter()
        .map(|task| match by_task.get(task.id.as_str()) {
            Some(proposal) => Task {
                start_date: Some(proposal.proposed_start),
                finish_date: Some(proposal.proposed_finish),
                ..task.clone()
            },
            None => task.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_path::compute_critical_path;
    use crate::models::test_support::at;
    use crate::models::Dependency;
    use chrono::NaiveDate;

    fn make_task(id: &str, duration: f64) -> Task {
        Task::new(id, id.to_uppercase(), duration)
    }

    fn plan(tasks: &[Task], floats: Option<&CriticalPathResult>) -> LevelingPlan {
        let resources = vec![Resource::new("dev", "Dana")];
        level_resources(tasks, &resources, &[], floats, &AnalysisConfig::default())
    }

    #[test]
    fn test_without_floats_moves_shortest_task() {
        let tasks = vec![
            make_task("a", 8.0)
                .with_dates(at(6, 9), at(6, 17))
                .with_assignees(["dev"]),
            make_task("b", 4.0)
                .with_dates(at(6, 9), at(6, 13))
                .with_assignees(["dev"]),
        ];
        let result = plan(&tasks, None);

        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.proposals.len(), 1);
        let proposal = &result.proposals[0];
        assert_eq!(proposal.task_id, "b");
        assert_eq!(proposal.resource_id, "dev");
        assert_eq!(proposal.proposed_start, at(7, 13));
        assert_eq!(proposal.proposed_finish, at(7, 17));
        assert_eq!(proposal.shift_hours, 28.0);
        assert_eq!(proposal.risk, RiskLevel::Medium);
        assert!(!proposal.preserves_critical_path);
    }

    #[test]
    fn test_floats_prefer_non_critical_task() {
        let tasks = vec![
            make_task("a", 8.0)
                .with_dates(at(6, 9), at(6, 17))
                .with_assignees(["dev"]),
            make_task("b", 4.0)
                .with_dates(at(6, 9), at(6, 13))
                .with_assignees(["dev"]),
            make_task("c", 40.0),
        ];
        // b -> c is the critical chain (44h); a has 36h of float
        let deps = vec![Dependency::new("b", "c")];
        let floats = compute_critical_path(&tasks, &deps, &AnalysisConfig::default()).unwrap();
        let result = plan(&tasks, Some(&floats));

        let proposal = &result.proposals[0];
        assert_eq!(proposal.task_id, "a");
        assert_eq!(proposal.proposed_start, at(7, 13));
        assert_eq!(proposal.proposed_finish, at(7, 21));
        assert_eq!(proposal.shift_hours, 28.0);
        assert_eq!(proposal.risk, RiskLevel::Low);
        assert!(proposal.preserves_critical_path);
    }

    #[test]
    fn test_float_shorter_than_shift_is_medium_risk() {
        let tasks = vec![
            make_task("a", 8.0)
                .with_dates(at(6, 9), at(6, 17))
                .with_assignees(["dev"]),
            make_task("b", 4.0)
                .with_dates(at(6, 9), at(6, 13))
                .with_assignees(["dev"]),
            make_task("c", 20.0),
        ];
        // b -> c runs 24h, leaving a only 16h of float against a 28h shift
        let deps = vec![Dependency::new("b", "c")];
        let floats = compute_critical_path(&tasks, &deps, &AnalysisConfig::default()).unwrap();
        let result = plan(&tasks, Some(&floats));

        let proposal = &result.proposals[0];
        assert_eq!(proposal.task_id, "a");
        assert_eq!(proposal.shift_hours, 28.0);
        assert_eq!(proposal.risk, RiskLevel::Medium);
        assert!(!proposal.preserves_critical_path);
    }

    #[test]
    fn test_shift_past_calendar_end_is_skipped() {
        let day = NaiveDate::MAX;
        let tasks = vec![
            make_task("a", 4.0)
                .with_dates(day.and_hms_opt(1, 0, 0).unwrap(), day.and_hms_opt(5, 0, 0).unwrap())
                .with_assignees(["dev"]),
            make_task("b", 4.0)
                .with_dates(day.and_hms_opt(1, 0, 0).unwrap(), day.and_hms_opt(5, 0, 0).unwrap())
                .with_assignees(["dev"]),
        ];
        let result = plan(&tasks, None);

        assert_eq!(result.conflicts.len(), 1);
        assert!(result.proposals.is_empty());
        assert!(result.warnings.contains(&DataWarning::DateOutOfRange {
            task_id: "a".to_string()
        }));
    }

    #[test]
    fn test_task_selected_twice_keeps_largest_shift() {
        let tasks = vec![
            make_task("a", 24.0)
                .with_dates(at(6, 9), at(8, 17))
                .with_assignees(["dev"]),
            make_task("b", 3.0)
                .with_dates(at(6, 9), at(6, 12))
                .with_assignees(["dev"]),
            make_task("c", 3.0)
                .with_dates(at(7, 9), at(7, 12))
                .with_assignees(["dev"]),
            make_task("x", 100.0),
        ];
        let deps = vec![Dependency::new("b", "x"), Dependency::new("c", "x")];
        let floats = compute_critical_path(&tasks, &deps, &AnalysisConfig::default()).unwrap();
        let result = plan(&tasks, Some(&floats));

        assert_eq!(result.conflicts.len(), 2);
        assert_eq!(result.proposals.len(), 1);
        let proposal = &result.proposals[0];
        assert_eq!(proposal.task_id, "a");
        assert_eq!(proposal.proposed_start, at(8, 12));
        assert_eq!(proposal.shift_hours, 51.0);
        assert_eq!(proposal.risk, RiskLevel::Low);
    }

    #[test]
    fn test_no_overload_no_proposals() {
        let tasks = vec![
            make_task("a", 8.0)
                .with_dates(at(6, 9), at(6, 17))
                .with_assignees(["dev"]),
            make_task("b", 8.0)
                .with_dates(at(7, 9), at(7, 17))
                .with_assignees(["dev"]),
        ];
        let result = plan(&tasks, None);

        assert!(result.proposals.is_empty());
        assert!(result.conflicts.is_empty());
        assert_eq!(result.utilization.resources[0].utilization_percent, 100.0);
        assert_eq!(result.health_score, result.utilization.health_score);
    }

    #[test]
    fn test_apply_leveling_preserves_duration() {
        let tasks = vec![
            make_task("a", 8.0)
                .with_dates(at(6, 9), at(6, 17))
                .with_assignees(["dev"]),
            make_task("b", 4.0)
                .with_dates(at(6, 9), at(6, 13))
                .with_assignees(["dev"]),
        ];
        let result = plan(&tasks, None);
        let leveled = apply_leveling(&tasks, &result.proposals);

        assert_eq!(leveled[0], tasks[0]);
        assert_eq!(leveled[1].start_date, Some(at(7, 13)));
        assert_eq!(leveled[1].finish_date, Some(at(7, 17)));
        assert_eq!(leveled[1].duration, Some(4.0));
        // Input snapshot is untouched
        assert_eq!(tasks[1].start_date, Some(at(6, 9)));

        // The leveled snapshot has no overload left
        assert!(plan(&leveled, None).conflicts.is_empty());
    }
}
