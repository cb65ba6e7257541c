//! Immutable baseline snapshots of a task set.

use chrono::NaiveDateTime;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use crate::graph::TaskGraph;
use crate::models::{sanitize_cost, DataWarning, Dependency, Task};

/// Reasons a baseline cannot be created. The call either succeeds completely or fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BaselineError {
    #[error("Baseline name must not be empty")]
    EmptyName,
    #[error("Baseline requires at least one task")]
    NoTasks,
    #[error("Duplicate task id in baseline: {task_id}")]
    DuplicateTask { task_id: String },
}

/// Planned values of one task at baseline time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub name: String,
    pub duration: f64,
    pub start_date: Option<NaiveDateTime>,
    pub finish_date: Option<NaiveDateTime>,
    /// Baseline (estimated) cost.
    pub cost: f64,
    pub assignee_ids: BTreeSet<String>,
    /// Incoming dependencies of this task.
    pub dependencies: Vec<Dependency>,
    pub milestone: bool,
}

/// Aggregate totals of a baseline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub task_count: usize,
    pub milestone_count: usize,
    pub total_duration: f64,
    pub total_cost: f64,
    pub earliest_start: Option<NaiveDateTime>,
    pub latest_finish: Option<NaiveDateTime>,
}

impl BaselineSummary {
    fn from_snapshots(snapshots: &[TaskSnapshot]) -> Self {
        Self {
            task_count: snapshots.len(),
            milestone_count: snapshots.iter().filter(|s| s.milestone).count(),
            total_duration: snapshots.iter().map(|s| s.duration).sum(),
            total_cost: snapshots.iter().map(|s| s.cost).sum(),
            earliest_start: snapshots.iter().filter_map(|s| s.start_date).min(),
            latest_finish: snapshots.iter().filter_map(|s| s.finish_date).max(),
        }
    }
}

/// A schedule frozen at a point in time.
///
/// Never mutated after creation; a newer plan is recorded by creating another
/// baseline. Several baselines may exist for one project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    id: Uuid,
    project_id: String,
    name: String,
    baseline_date: NaiveDateTime,
    tasks: Vec<TaskSnapshot>,
    summary: BaselineSummary,
    #[serde(default)]
    warnings: Vec<DataWarning>,
}

impl Baseline {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn baseline_date(&self) -> NaiveDateTime {
        self.baseline_date
    }

    /// Task snapshots in input order.
    pub fn tasks(&self) -> &[TaskSnapshot] {
        &self.tasks
    }

    /// Single lookup by id. Use `index` when looking up many tasks.
    pub fn task(&self, task_id: &str) -> Option<&TaskSnapshot> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Snapshots keyed by task id.
    pub fn index(&self) -> FxHashMap<&str, &TaskSnapshot> {
        self.tasks.iter().map(|t| (t.task_id.as_str(), t)).collect()
    }

    pub fn summary(&self) -> &BaselineSummary {
        &self.summary
    }

    /// Data-quality warnings raised while snapshotting.
    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }
}

/// Snapshot `tasks` and their dependencies as a new baseline.
///
/// Dangling or self dependencies are dropped with a warning; invalid
/// durations and costs are recorded as 0.
pub fn create_baseline(
    project_id: &str,
    name: &str,
    tasks: &[Task],
    dependencies: &[Dependency],
    baseline_date: NaiveDateTime,
) -> Result<Baseline, BaselineError> {
    if name.trim().is_empty() {
        return Err(BaselineError::EmptyName);
    }
    if tasks.is_empty() {
        return Err(BaselineError::NoTasks);
    }
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(BaselineError::DuplicateTask {
                task_id: task.id.clone(),
            });
        }
    }

    let graph = TaskGraph::build(tasks, dependencies);
    let mut warnings = graph.warnings().to_vec();

    let snapshots: Vec<TaskSnapshot> = graph
        .nodes()
        .map(|node| {
            let task = graph.task(node);
            let incoming = graph
                .predecessors(node)
                .map(|edge| Dependency {
                    predecessor_id: graph.task_id(edge.from).to_string(),
                    successor_id: task.id.clone(),
                    dependency_type: edge.dependency_type,
                    lag_hours: edge.lag,
                })
                .collect();
            TaskSnapshot {
                task_id: task.id.clone(),
                name: task.name.clone(),
                duration: graph.duration(node),
                start_date: task.start_date,
                finish_date: task.finish_date,
                cost: sanitize_cost(&task.id, "estimated_cost", task.estimated_cost, &mut warnings),
                assignee_ids: task.assignee_ids.clone(),
                dependencies: incoming,
                milestone: task.milestone,
            }
        })
        .collect();

    Ok(Baseline {
        id: Uuid::new_v4(),
        project_id: project_id.to_string(),
        name: name.trim().to_string(),
        baseline_date,
        summary: BaselineSummary::from_snapshots(&snapshots),
        tasks: snapshots,
        warnings,
    })
}
