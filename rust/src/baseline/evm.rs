//! Earned value management metrics.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::snapshot::Baseline;

/// Overall project health derived from SPI and CPI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvmStatus {
    Excellent,
    Good,
    Concerning,
    Critical,
}

impl EvmStatus {
    pub fn from_indices(spi: f64, cpi: f64) -> Self {
        if spi >= 1.0 && cpi >= 1.0 {
            Self::Excellent
        } else if spi >= 0.95 && cpi >= 0.95 {
            Self::Good
        } else if spi >= 0.85 || cpi >= 0.85 {
            Self::Concerning
        } else {
            Self::Critical
        }
    }
}

/// Standard EVM values for a project measured against its baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvmMetrics {
    /// PV: total baseline cost.
    pub planned_value: f64,
    /// EV: baseline cost of the work completed.
    pub earned_value: f64,
    /// AC: reported actual cost, or earned value where none is reported.
    pub actual_cost: f64,
    pub schedule_performance_index: f64,
    pub cost_performance_index: f64,
    /// SV = EV - PV.
    pub schedule_variance: f64,
    /// CV = EV - AC.
    pub cost_variance: f64,
    pub budget_at_completion: f64,
    pub estimate_at_completion: f64,
    pub variance_at_completion: f64,
    pub to_complete_performance_index: f64,
    pub status: EvmStatus,
}

/// Progress of one baseline task in the current snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Progress {
    /// Clamped to 0..=100.
    pub percent_complete: f64,
    /// Sanitized actual cost; 0 when not reported.
    pub actual_cost: f64,
}

/// EVM metrics of `baseline` given per-task progress.
///
/// Baseline tasks missing from `progress` (deleted tasks) count as 0% complete.
pub(crate) fn earned_value(
    baseline: &Baseline,
    progress: &FxHashMap<&str, Progress>,
) -> EvmMetrics {
    let mut planned_value = 0.0;
    let mut earned_value = 0.0;
    let mut actual_cost = 0.0;

    for snapshot in baseline.tasks() {
        let task_progress = progress
            .get(snapshot.task_id.as_str())
            .copied()
            .unwrap_or_default();
        let earned = snapshot.cost * task_progress.percent_complete / 100.0;
        planned_value += snapshot.cost;
        earned_value += earned;
        actual_cost += if task_progress.actual_cost > 0.0 {
            task_progress.actual_cost
        } else {
            earned
        };
    }

    let spi = if planned_value == 0.0 {
        1.0
    } else {
        earned_value / planned_value
    };
    let cpi = if actual_cost == 0.0 {
        1.0
    } else {
        earned_value / actual_cost
    };
    let bac = baseline.summary().total_cost;
    let eac = if cpi == 0.0 { bac } else { bac / cpi };
    let tcpi_denominator = bac - actual_cost;
    let tcpi = if tcpi_denominator <= 0.0 {
        0.0
    } else {
        (bac - earned_value) / tcpi_denominator
    };

    EvmMetrics {
        planned_value,
        earned_value,
        actual_cost,
        schedule_performance_index: spi,
        cost_performance_index: cpi,
        schedule_variance: earned_value - planned_value,
        cost_variance: earned_value - actual_cost,
        budget_at_completion: bac,
        estimate_at_completion: eac,
        variance_at_completion: bac - eac,
        to_complete_performance_index: tcpi,
        status: EvmStatus::from_indices(spi, cpi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::create_baseline;
    use crate::models::test_support::at;
    use crate::models::Task;

    fn costed_baseline() -> Baseline {
        let tasks = vec![
            Task::new("a", "A", 8.0).with_costs(Some(1000.0), None),
            Task::new("b", "B", 8.0).with_costs(Some(1000.0), None),
        ];
        create_baseline("p1", "v1", &tasks, &[], at(5, 0)).unwrap()
    }

    fn progress(entries: &[(&'static str, f64, f64)]) -> FxHashMap<&'static str, Progress> {
        entries
            .iter()
            .map(|&(id, percent_complete, actual_cost)| {
                (
                    id,
                    Progress {
                        percent_complete,
                        actual_cost,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_status_table() {
        assert_eq!(EvmStatus::from_indices(1.0, 1.2), EvmStatus::Excellent);
        assert_eq!(EvmStatus::from_indices(0.96, 1.0), EvmStatus::Good);
        assert_eq!(EvmStatus::from_indices(0.5, 0.9), EvmStatus::Concerning);
        assert_eq!(EvmStatus::from_indices(0.8, 0.8), EvmStatus::Critical);
    }

    #[test]
    fn test_half_done_over_budget() {
        // a is done at 1500, b not started
        let metrics = earned_value(
            &costed_baseline(),
            &progress(&[("a", 100.0, 1500.0), ("b", 0.0, 0.0)]),
        );

        assert_eq!(metrics.planned_value, 2000.0);
        assert_eq!(metrics.earned_value, 1000.0);
        assert_eq!(metrics.actual_cost, 1500.0);
        assert_eq!(metrics.schedule_performance_index, 0.5);
        assert!((metrics.cost_performance_index - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.schedule_variance, -1000.0);
        assert_eq!(metrics.cost_variance, -500.0);
        assert!((metrics.estimate_at_completion - 3000.0).abs() < 1e-9);
        assert!((metrics.variance_at_completion + 1000.0).abs() < 1e-9);
        // (2000 - 1000) / (2000 - 1500)
        assert_eq!(metrics.to_complete_performance_index, 2.0);
        assert_eq!(metrics.status, EvmStatus::Critical);
    }

    #[test]
    fn test_zero_denominators_use_defaults() {
        let tasks = vec![Task::new("a", "A", 8.0)];
        let baseline = create_baseline("p1", "v1", &tasks, &[], at(5, 0)).unwrap();
        let metrics = earned_value(&baseline, &progress(&[("a", 50.0, 0.0)]));

        assert_eq!(metrics.schedule_performance_index, 1.0);
        assert_eq!(metrics.cost_performance_index, 1.0);
        assert_eq!(metrics.estimate_at_completion, 0.0);
        assert_eq!(metrics.to_complete_performance_index, 0.0);
        assert!(metrics.schedule_performance_index.is_finite());
    }

    #[test]
    fn test_deleted_task_earns_nothing() {
        let metrics = earned_value(&costed_baseline(), &progress(&[("a", 100.0, 1000.0)]));
        assert_eq!(metrics.earned_value, 1000.0);
        assert_eq!(metrics.actual_cost, 1000.0);
        assert_eq!(metrics.schedule_performance_index, 0.5);
    }
}
