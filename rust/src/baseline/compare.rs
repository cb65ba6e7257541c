//! Differences between two baselines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::snapshot::Baseline;
use super::variance::ChangeKind;

const EPSILON: f64 = 1e-9;

/// A task whose snapshot differs between two baselines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotChange {
    pub task_id: String,
    pub change: ChangeKind,
    /// Second minus first; a removed task counts its full value negative.
    pub duration_delta: f64,
    pub cost_delta: f64,
}

/// Task-level diff of two baselines plus aggregate deltas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub first_id: Uuid,
    pub second_id: Uuid,
    /// Tasks only in the second baseline.
    pub added: Vec<SnapshotChange>,
    /// Tasks only in the first baseline.
    pub removed: Vec<SnapshotChange>,
    /// Tasks in both whose duration or cost changed.
    pub modified: Vec<SnapshotChange>,
    pub duration_delta: f64,
    pub cost_delta: f64,
}

impl BaselineComparison {
    pub fn is_identical(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.duration_delta.abs() <= EPSILON
            && self.cost_delta.abs() <= EPSILON
    }
}

/// Diff `second` against `first` by task id.
pub fn compare_baselines(first: &Baseline, second: &Baseline) -> BaselineComparison {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut modified = Vec::new();
    let first_index = first.index();
    let second_index = second.index();

    for old in first.tasks() {
        match second_index.get(old.task_id.as_str()) {
            Some(new) => {
                let duration_delta = new.duration - old.duration;
                let cost_delta = new.cost - old.cost;
                if duration_delta.abs() > EPSILON || cost_delta.abs() > EPSILON {
                    modified.push(SnapshotChange {
                        task_id: old.task_id.clone(),
                        change: ChangeKind::Modified,
                        duration_delta,
                        cost_delta,
                    });
                }
            }
            None => removed.push(SnapshotChange {
                task_id: old.task_id.clone(),
                change: ChangeKind::Deleted,
                duration_delta: -old.duration,
                cost_delta: -old.cost,
            }),
        }
    }
    for new in second.tasks() {
        if !first_index.contains_key(new.task_id.as_str()) {
            added.push(SnapshotChange {
                task_id: new.task_id.clone(),
                change: ChangeKind::Added,
                duration_delta: new.duration,
                cost_delta: new.cost,
            });
        }
    }

    BaselineComparison {
        first_id: first.id(),
        second_id: second.id(),
        added,
        removed,
        modified,
        duration_delta: second.summary().total_duration - first.summary().total_duration,
        cost_delta: second.summary().total_cost - first.summary().total_cost,
    }
}
