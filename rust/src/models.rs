//! Core data types for the schedule analysis engine.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How a dependency links the predecessor's and successor's endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    #[default]
    #[serde(alias = "FS")]
    FinishToStart,
    #[serde(alias = "SS")]
    StartToStart,
    #[serde(alias = "FF")]
    FinishToFinish,
    #[serde(alias = "SF")]
    StartToFinish,
}

impl DependencyType {
    /// Short code used in messages (FS, SS, FF, SF).
    pub fn code(self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }
}

/// A precedence link between two tasks with optional lag (hours, may be negative).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor_id: String,
    pub successor_id: String,
    #[serde(default, rename = "type")]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub lag_hours: f64,
}

impl Dependency {
    pub fn new(predecessor_id: impl Into<String>, successor_id: impl Into<String>) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            dependency_type: DependencyType::FinishToStart,
            lag_hours: 0.0,
        }
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    pub fn with_lag(mut self, lag_hours: f64) -> Self {
        self.lag_hours = lag_hours;
        self
    }
}

/// A unit of scheduled work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Work in hours. `None` means the caller did not supply one.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub finish_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default)]
    pub assignee_ids: BTreeSet<String>,
    /// Derived by the critical path calculator; ignored on input.
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub milestone: bool,
    #[serde(default)]
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub actual_cost: Option<f64>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, duration: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration: Some(duration),
            start_date: None,
            finish_date: None,
            percent_complete: 0.0,
            assignee_ids: BTreeSet::new(),
            critical: false,
            milestone: false,
            estimated_cost: None,
            actual_cost: None,
        }
    }

    pub fn with_dates(mut self, start: NaiveDateTime, finish: NaiveDateTime) -> Self {
        self.start_date = Some(start);
        self.finish_date = Some(finish);
        self
    }

    pub fn with_assignees<I, S>(mut self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignee_ids = assignees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_costs(mut self, estimated: Option<f64>, actual: Option<f64>) -> Self {
        self.estimated_cost = estimated;
        self.actual_cost = actual;
        self
    }

    pub fn with_progress(mut self, percent_complete: f64) -> Self {
        self.percent_complete = percent_complete;
        self
    }

    /// Calendar window the task occupies.
    ///
    /// Uses both dates when present and ordered; falls back to
    /// `start + duration` when only the start is known. `None` when the
    /// computed finish falls outside the representable calendar.
    pub fn window(&self, duration_hours: f64) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.start_date, self.finish_date) {
            (Some(start), Some(finish)) if finish >= start => Some((start, finish)),
            (Some(_), Some(_)) => None,
            (Some(start), None) => {
                let finish = start.checked_add_signed(hours_to_duration(duration_hours)?)?;
                Some((start, finish))
            }
            _ => None,
        }
    }
}

/// A person or team that tasks are assigned to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_weekly_capacity")]
    pub weekly_capacity_hours: f64,
}

fn default_weekly_capacity() -> f64 {
    40.0
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weekly_capacity_hours: default_weekly_capacity(),
        }
    }
}

/// Explicit share of a resource's time given to one task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub task_id: String,
    pub resource_id: String,
    pub allocation_percent: f64,
}

impl ResourceAllocation {
    pub fn new(
        task_id: impl Into<String>,
        resource_id: impl Into<String>,
        allocation_percent: f64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            resource_id: resource_id.into(),
            allocation_percent,
        }
    }
}

/// Severity shared by conflicts and variance records, least severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severity of a resource whose accumulated allocation is `percent`.
    pub fn from_allocation_percent(percent: f64) -> Self {
        if percent <= 110.0 {
            Self::Low
        } else if percent <= 150.0 {
            Self::Medium
        } else if percent <= 200.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Severity of a plan-vs-actual deviation of `percent` (sign ignored).
    pub fn from_variance_percent(percent: f64) -> Self {
        let magnitude = percent.abs();
        if magnitude <= 5.0 {
            Self::Low
        } else if magnitude <= 15.0 {
            Self::Medium
        } else if magnitude <= 30.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

/// Risk of acting on a recommendation or proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A non-fatal data quality problem found while reading the input snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    MissingDuration { task_id: String },
    InvalidDuration { task_id: String, value: f64 },
    NegativeCost { task_id: String, field: String, value: f64 },
    PercentCompleteOutOfRange { task_id: String, value: f64 },
    FinishBeforeStart { task_id: String },
    DateOutOfRange { task_id: String },
    LagOutOfRange { predecessor_id: String, successor_id: String, value: f64 },
    DuplicateTask { task_id: String },
    SelfDependency { task_id: String },
    DanglingDependency { predecessor_id: String, successor_id: String },
    UnknownResource { resource_id: String },
    InvalidCapacity { resource_id: String, value: f64 },
    CyclicGraph { detail: String },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDuration { task_id } => {
                write!(f, "Task {} has no duration; treated as 0h", task_id)
            }
            Self::InvalidDuration { task_id, value } => {
                write!(f, "Task {} has invalid duration {}; treated as 0h", task_id, value)
            }
            Self::NegativeCost { task_id, field, value } => {
                write!(f, "Task {} has negative {} {}; treated as 0", task_id, field, value)
            }
            Self::PercentCompleteOutOfRange { task_id, value } => {
                write!(f, "Task {} percent complete {} clamped to 0-100", task_id, value)
            }
            Self::FinishBeforeStart { task_id } => {
                write!(f, "Task {} finishes before it starts; dates ignored", task_id)
            }
            Self::DateOutOfRange { task_id } => {
                write!(f, "Task {} has a date outside the supported range; dates ignored", task_id)
            }
            Self::LagOutOfRange {
                predecessor_id,
                successor_id,
                value,
            } => write!(
                f,
                "Dependency {} -> {} has lag {}h outside the supported range; date check skipped",
                predecessor_id, successor_id, value
            ),
            Self::DuplicateTask { task_id } => {
                write!(f, "Duplicate task id {}; later entry ignored", task_id)
            }
            Self::SelfDependency { task_id } => {
                write!(f, "Task {} depends on itself; dependency ignored", task_id)
            }
            Self::DanglingDependency {
                predecessor_id,
                successor_id,
            } => write!(
                f,
                "Dependency {} -> {} references an unknown task; dependency ignored",
                predecessor_id, successor_id
            ),
            Self::UnknownResource { resource_id } => {
                write!(f, "Resource {} is not in the resource list", resource_id)
            }
            Self::InvalidCapacity { resource_id, value } => write!(
                f,
                "Resource {} has invalid weekly capacity {}; using a standard workday",
                resource_id, value
            ),
            Self::CyclicGraph { detail } => write!(f, "Dependency graph is cyclic: {}", detail),
        }
    }
}

/// Drop repeated warnings, keeping the first occurrence of each.
pub fn dedup_warnings(warnings: &mut Vec<DataWarning>) {
    let mut seen: Vec<DataWarning> = Vec::with_capacity(warnings.len());
    warnings.retain(|w| {
        if seen.contains(w) {
            false
        } else {
            seen.push(w.clone());
            true
        }
    });
}

/// Convert fractional hours into a chrono duration (millisecond precision).
///
/// `None` for values that are not finite or exceed chrono's range.
pub fn hours_to_duration(hours: f64) -> Option<TimeDelta> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

/// Convert a chrono duration into fractional hours.
pub fn duration_hours(duration: TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

/// Duration of a task in hours, coerced to 0 when missing, negative or not finite.
pub fn sanitize_duration(task: &Task, warnings: &mut Vec<DataWarning>) -> f64 {
    match task.duration {
        None => {
            warnings.push(DataWarning::MissingDuration {
                task_id: task.id.clone(),
            });
            0.0
        }
        Some(d) if !d.is_finite() || d < 0.0 => {
            warnings.push(DataWarning::InvalidDuration {
                task_id: task.id.clone(),
                value: d,
            });
            0.0
        }
        Some(d) => d,
    }
}

/// Cost value coerced to 0 when negative or not finite. Missing costs are 0 without a warning.
pub fn sanitize_cost(
    task_id: &str,
    field: &str,
    value: Option<f64>,
    warnings: &mut Vec<DataWarning>,
) -> f64 {
    match value {
        None => 0.0,
        Some(v) if !v.is_finite() || v < 0.0 => {
            warnings.push(DataWarning::NegativeCost {
                task_id: task_id.to_string(),
                field: field.to_string(),
                value: v,
            });
            0.0
        }
        Some(v) => v,
    }
}

/// Percent complete clamped into 0..=100.
pub fn sanitize_percent(task: &Task, warnings: &mut Vec<DataWarning>) -> f64 {
    let value = task.percent_complete;
    if !value.is_finite() {
        warnings.push(DataWarning::PercentCompleteOutOfRange {
            task_id: task.id.clone(),
            value,
        });
        return 0.0;
    }
    if !(0.0..=100.0).contains(&value) {
        warnings.push(DataWarning::PercentCompleteOutOfRange {
            task_id: task.id.clone(),
            value,
        });
    }
    value.clamp(0.0, 100.0)
}

/// Dated window of a task, recording a warning when the dates are inverted.
pub fn task_window(
    task: &Task,
    duration_hours: f64,
    warnings: &mut Vec<DataWarning>,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    if let (Some(start), Some(finish)) = (task.start_date, task.finish_date) {
        if finish < start {
            warnings.push(DataWarning::FinishBeforeStart {
                task_id: task.id.clone(),
            });
            return None;
        }
    }
    let window = task.window(duration_hours);
    if window.is_none() && task.start_date.is_some() {
        warnings.push(DataWarning::DateOutOfRange {
            task_id: task.id.clone(),
        });
    }
    window
}


#[cfg(test)]
mod tests {
    use super::test_support::at;
    use super::*;

    #[test]
    fn test_dependency_type_aliases() {
        let dep: Dependency = serde_json::from_str(
            r#"{"predecessor_id": "a", "successor_id": "b", "type": "SS", "lag_hours": -2}"#,
        )
        .unwrap();
        assert_eq!(dep.dependency_type, DependencyType::StartToStart);
        assert!((dep.lag_hours + 2.0).abs() < 1e-9);

        let dep: Dependency =
            serde_json::from_str(r#"{"predecessor_id": "a", "successor_id": "b"}"#).unwrap();
        assert_eq!(dep.dependency_type, DependencyType::FinishToStart);
    }

    #[test]
    fn test_task_window() {
        let task = Task::new("a", "A", 8.0).with_dates(at(6, 9), at(6, 17));
        assert_eq!(task.window(8.0), Some((at(6, 9), at(6, 17))));

        let mut start_only = Task::new("b", "B", 10.0);
        start_only.start_date = Some(at(6, 8));
        assert_eq!(start_only.window(10.0), Some((at(6, 8), at(6, 18))));

        let inverted = Task::new("c", "C", 8.0).with_dates(at(7, 9), at(6, 9));
        assert_eq!(inverted.window(8.0), None);
        let mut warnings = Vec::new();
        assert_eq!(task_window(&inverted, 8.0, &mut warnings), None);
        assert_eq!(
            warnings,
            vec![DataWarning::FinishBeforeStart {
                task_id: "c".to_string()
            }]
        );
    }

    #[test]
    fn test_sanitize_duration() {
        let mut warnings = Vec::new();
        let mut task = Task::new("a", "A", -3.0);
        assert_eq!(sanitize_duration(&task, &mut warnings), 0.0);
        task.duration = None;
        assert_eq!(sanitize_duration(&task, &mut warnings), 0.0);
        task.duration = Some(f64::NAN);
        assert_eq!(sanitize_duration(&task, &mut warnings), 0.0);
        task.duration = Some(6.5);
        assert_eq!(sanitize_duration(&task, &mut warnings), 6.5);
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_sanitize_cost_and_percent() {
        let mut warnings = Vec::new();
        assert_eq!(sanitize_cost("a", "estimated_cost", None, &mut warnings), 0.0);
        assert_eq!(sanitize_cost("a", "estimated_cost", Some(-5.0), &mut warnings), 0.0);
        assert_eq!(sanitize_cost("a", "actual_cost", Some(12.0), &mut warnings), 12.0);
        assert_eq!(warnings.len(), 1);

        let task = Task::new("a", "A", 1.0).with_progress(140.0);
        assert_eq!(sanitize_percent(&task, &mut warnings), 100.0);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_allocation_percent(110.0), Severity::Low);
        assert_eq!(Severity::from_allocation_percent(150.0), Severity::Medium);
        assert_eq!(Severity::from_allocation_percent(200.0), Severity::High);
        assert_eq!(Severity::from_allocation_percent(250.0), Severity::Critical);

        assert_eq!(Severity::from_variance_percent(-5.0), Severity::Low);
        assert_eq!(Severity::from_variance_percent(15.0), Severity::Medium);
        assert_eq!(Severity::from_variance_percent(20.0), Severity::High);
        assert_eq!(Severity::from_variance_percent(-31.0), Severity::Critical);
        assert!(Severity::Critical > Severity::High);
    }

    #[test]
    fn test_hours_round_trip() {
        assert!((duration_hours(hours_to_duration(2.5).unwrap()) - 2.5).abs() < 1e-9);
        assert_eq!(hours_to_duration(-1.0), Some(TimeDelta::hours(-1)));
        assert_eq!(hours_to_duration(-1e300), None);
        assert_eq!(hours_to_duration(f64::INFINITY), None);
    }

    #[test]
    fn test_window_past_calendar_end() {
        let mut task = Task::new("far", "Far", 1e10);
        task.start_date = Some(at(6, 8));
        assert_eq!(task.window(1e10), None);

        let mut warnings = Vec::new();
        assert_eq!(task_window(&task, 1e10, &mut warnings), None);
        assert_eq!(
            warnings,
            vec![DataWarning::DateOutOfRange {
                task_id: "far".to_string()
            }]
        );
        // Undated tasks are simply unscheduled
        assert_eq!(task_window(&Task::new("u", "U", 1e10), 1e10, &mut warnings), None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_warning_display() {
        let warning = DataWarning::DanglingDependency {
            predecessor_id: "x".to_string(),
            successor_id: "b".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "Dependency x -> b references an unknown task; dependency ignored"
        );
    }
}
