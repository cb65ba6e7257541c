//! Project schedule analysis engine.
//!
//! Pure functions over caller-supplied snapshots of tasks, dependencies and
//! resources: critical path, conflict detection, resource leveling, baseline
//! variance with earned value metrics, and schedule compression suggestions.
//! Nothing is persisted; every call returns a fresh result.

pub mod logging;

pub mod baseline;
pub mod config;
pub mod conflicts;
pub mod critical_path;
pub mod engine;
pub mod graph;
mod interner;
pub mod leveling;
pub mod models;
pub mod optimizer;

#[cfg(feature = "python")]
mod python;

pub use baseline::{
    analyze_variance, compare_baselines, create_baseline, Baseline, BaselineComparison,
    BaselineError, EvmMetrics, EvmStatus, VarianceReport,
};
pub use config::AnalysisConfig;
pub use conflicts::{detect_conflicts, Conflict, ConflictReport, ConflictType};
pub use critical_path::{
    compute_critical_path, enumerate_paths, longest_path, mark_critical, CriticalPathResult,
    FloatRecord, SchedulePath, SchedulingError,
};
pub use engine::{AnalysisRequest, AnalysisResponse, EngineError, ScheduleEngine};
pub use graph::TaskGraph;
pub use interner::NodeId;
pub use leveling::{
    analyze_resource_utilization, analyze_workload, apply_leveling, level_resources,
    LevelingPlan, LevelingProposal, ResourceUtilizationReport, WorkloadReport,
};
pub use models::{
    DataWarning, Dependency, DependencyType, Resource, ResourceAllocation, RiskLevel, Severity,
    Task,
};
pub use optimizer::{optimize_schedule, OptimizationReport, Opportunity};
