//! Types for critical path analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::graph::EdgeRef;
use crate::models::DataWarning;

/// Errors that prevent a critical path from being computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Circular dependencies detected: {}", format_edges(.edges))]
    CyclicDependencies { edges: Vec<EdgeRef> },
    #[error("Path enumeration refused: {tasks} tasks exceeds the limit of {limit}")]
    GraphTooLarge { tasks: usize, limit: usize },
    #[error("Path enumeration aborted after {limit} paths")]
    PathLimitExceeded { limit: usize },
}

fn format_edges(edges: &[EdgeRef]) -> String {
    edges
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-task timing from the forward and backward passes, in hours from project start.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatRecord {
    pub task_id: String,
    /// Earliest possible start time (from forward pass).
    pub earliest_start: f64,
    /// Earliest possible finish time (from forward pass).
    pub earliest_finish: f64,
    /// Latest allowable start time (from backward pass).
    pub latest_start: f64,
    /// Latest allowable finish time (from backward pass).
    pub latest_finish: f64,
    /// latest_start - earliest_start.
    pub total_float: f64,
    /// Slack before the earliest successor is delayed.
    pub free_float: f64,
    pub critical: bool,
}

/// Result of a critical path calculation over a whole task snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathResult {
    /// Float records in topological order.
    pub records: Vec<FloatRecord>,
    /// Ids of tasks with zero total float.
    pub critical_task_ids: BTreeSet<String>,
    /// Critical tasks in topological order.
    pub critical_chain: Vec<String>,
    /// Maximum earliest finish over all tasks (hours).
    pub project_duration: f64,
    /// Sum of all task durations (hours).
    pub total_work: f64,
    pub warnings: Vec<DataWarning>,
}

impl CriticalPathResult {
    /// Float record for a task id.
    pub fn record(&self, task_id: &str) -> Option<&FloatRecord> {
        self.records.iter().find(|r| r.task_id == task_id)
    }

    pub fn is_critical(&self, task_id: &str) -> bool {
        self.critical_task_ids.contains(task_id)
    }
}

/// One source-to-sink chain of tasks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulePath {
    pub task_ids: Vec<String>,
    /// Sum of task durations along the path (hours).
    pub total_duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_names_edges() {
        let err = SchedulingError::CyclicDependencies {
            edges: vec![
                EdgeRef {
                    predecessor_id: "a".to_string(),
                    successor_id: "b".to_string(),
                },
                EdgeRef {
                    predecessor_id: "b".to_string(),
                    successor_id: "a".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependencies detected: a -> b, b -> a"
        );
    }

    #[test]
    fn test_record_lookup() {
        let result = CriticalPathResult {
            records: vec![FloatRecord {
                task_id: "a".to_string(),
                critical: true,
                ..Default::default()
            }],
            critical_task_ids: BTreeSet::from(["a".to_string()]),
            ..Default::default()
        };
        assert!(result.record("a").is_some());
        assert!(result.record("b").is_none());
        assert!(result.is_critical("a"));
    }
}
