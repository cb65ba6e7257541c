//! Resource leveling and workload analytics.
//!
//! Over-allocation windows found by the conflict detector are resolved by
//! moving one conflicting task past the window, preferring the task with the
//! most float so the critical path is left alone. Utilization and workload
//! reports describe how evenly work is spread across resources.

mod proposals;
mod utilization;
mod workload;

pub use proposals::{apply_leveling, level_resources, LevelingPlan, LevelingProposal};
pub use utilization::{
    analyze_resource_utilization, resource_health_score, ResourceUtilization,
    ResourceUtilizationReport, UtilizationStatus,
};
pub use workload::{
    analyze_workload, workload_balance_score, Bottleneck, DailyLoad, ResourceWorkload,
    WorkPeriod, WorkloadReport,
};
