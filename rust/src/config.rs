//! Configuration for the schedule analysis engine.

use serde::{Deserialize, Serialize};

/// Tunables shared by every analysis operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
    /// Working hours in one calendar day of a fully utilized resource.
    pub hours_per_day: f64,
    /// Working days per week, used to turn weekly capacity into daily capacity.
    pub workdays_per_week: f64,
    /// Allocation applied to an assignee without an explicit allocation.
    pub default_allocation_percent: f64,
    /// Total float at or below this value marks a task as critical.
    pub critical_epsilon: f64,
    /// Largest graph (task count) all-paths enumeration will start on.
    pub max_path_graph_tasks: usize,
    /// Enumeration aborts once this many source-to-sink paths were produced.
    pub max_enumerated_paths: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            hours_per_day: 8.0,
            workdays_per_week: 5.0,
            default_allocation_percent: 100.0,
            critical_epsilon: 1e-9,
            max_path_graph_tasks: 250,
            max_enumerated_paths: 10_000,
        }
    }
}

impl AnalysisConfig {
    /// Daily capacity in hours for a resource with the given weekly capacity.
    pub fn daily_capacity(&self, weekly_capacity_hours: f64) -> f64 {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(self.workdays_per_week) || !usable(weekly_capacity_hours) {
            return self.hours_per_day;
        }
        weekly_capacity_hours / self.workdays_per_week
    }
}
