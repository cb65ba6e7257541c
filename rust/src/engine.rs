//! Operation dispatch: one request variant per analysis, matched exhaustively.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::baseline::{
    analyze_variance, compare_baselines, create_baseline, Baseline, BaselineComparison,
    BaselineError, VarianceReport,
};
use crate::config::AnalysisConfig;
use crate::conflicts::{detect_conflicts, ConflictReport};
use crate::critical_path::{
    compute_critical_path, enumerate_paths, CriticalPathResult, SchedulePath, SchedulingError,
};
use crate::leveling::{
    analyze_resource_utilization, analyze_workload, apply_leveling, level_resources,
    LevelingPlan, LevelingProposal, ResourceUtilizationReport, WorkloadReport,
};
use crate::log_debug;
use crate::models::{Dependency, Resource, ResourceAllocation, Task};
use crate::optimizer::{optimize_schedule, OptimizationReport};

/// Errors surfaced by the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    #[error(transparent)]
    Baseline(#[from] BaselineError),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single analysis to run over a caller-supplied snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum AnalysisRequest {
    ComputeCriticalPath {
        tasks: Vec<Task>,
        #[serde(default)]
        dependencies: Vec<Dependency>,
    },
    EnumeratePaths {
        tasks: Vec<Task>,
        #[serde(default)]
        dependencies: Vec<Dependency>,
    },
    DetectConflicts {
        tasks: Vec<Task>,
        #[serde(default)]
        dependencies: Vec<Dependency>,
        #[serde(default)]
        allocations: Vec<ResourceAllocation>,
    },
    LevelResources {
        tasks: Vec<Task>,
        #[serde(default)]
        resources: Vec<Resource>,
        #[serde(default)]
        allocations: Vec<ResourceAllocation>,
        #[serde(default)]
        floats: Option<CriticalPathResult>,
    },
    ApplyLeveling {
        tasks: Vec<Task>,
        proposals: Vec<LevelingProposal>,
    },
    AnalyzeWorkload {
        tasks: Vec<Task>,
        #[serde(default)]
        resources: Vec<Resource>,
        #[serde(default)]
        allocations: Vec<ResourceAllocation>,
    },
    AnalyzeResourceUtilization {
        tasks: Vec<Task>,
        #[serde(default)]
        resources: Vec<Resource>,
        #[serde(default)]
        allocations: Vec<ResourceAllocation>,
    },
    CreateBaseline {
        project_id: String,
        name: String,
        tasks: Vec<Task>,
        #[serde(default)]
        dependencies: Vec<Dependency>,
        /// Defaults to the current UTC time.
        #[serde(default)]
        baseline_date: Option<NaiveDateTime>,
    },
    AnalyzeVariance {
        baseline: Baseline,
        tasks: Vec<Task>,
    },
    CompareBaselines {
        first: Baseline,
        second: Baseline,
    },
    OptimizeSchedule {
        tasks: Vec<Task>,
        #[serde(default)]
        dependencies: Vec<Dependency>,
        #[serde(default)]
        resources: Vec<Resource>,
    },
}

impl AnalysisRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ComputeCriticalPath { .. } => "compute_critical_path",
            Self::EnumeratePaths { .. } => "enumerate_paths",
            Self::DetectConflicts { .. } => "detect_conflicts",
            Self::LevelResources { .. } => "level_resources",
            Self::ApplyLeveling { .. } => "apply_leveling",
            Self::AnalyzeWorkload { .. } => "analyze_workload",
            Self::AnalyzeResourceUtilization { .. } => "analyze_resource_utilization",
            Self::CreateBaseline { .. } => "create_baseline",
            Self::AnalyzeVariance { .. } => "analyze_variance",
            Self::CompareBaselines { .. } => "compare_baselines",
            Self::OptimizeSchedule { .. } => "optimize_schedule",
        }
    }
}

/// Result of an [`AnalysisRequest`], one variant per operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "result", rename_all = "snake_case")]
pub enum AnalysisResponse {
    ComputeCriticalPath(CriticalPathResult),
    EnumeratePaths(Vec<SchedulePath>),
    DetectConflicts(ConflictReport),
    LevelResources(LevelingPlan),
    ApplyLeveling(Vec<Task>),
    AnalyzeWorkload(WorkloadReport),
    AnalyzeResourceUtilization(ResourceUtilizationReport),
    CreateBaseline(Baseline),
    AnalyzeVariance(VarianceReport),
    CompareBaselines(BaselineComparison),
    OptimizeSchedule(OptimizationReport),
}

/// Stateless analysis engine. Holds only its configuration.
#[derive(Clone, Debug, Default)]
pub struct ScheduleEngine {
    config: AnalysisConfig,
}

impl ScheduleEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run one analysis.
    pub fn execute(&self, request: AnalysisRequest) -> Result<AnalysisResponse, EngineError> {
        let config = &self.config;
        log_debug!(config.verbosity, "executing {}", request.operation());

        let response = match request {
            AnalysisRequest::ComputeCriticalPath {
                tasks,
                dependencies,
            } => AnalysisResponse::ComputeCriticalPath(compute_critical_path(
                &tasks,
                &dependencies,
                config,
            )?),
            AnalysisRequest::EnumeratePaths {
                tasks,
                dependencies,
            } => AnalysisResponse::EnumeratePaths(enumerate_paths(&tasks, &dependencies, config)?),
            AnalysisRequest::DetectConflicts {
                tasks,
                dependencies,
                allocations,
            } => AnalysisResponse::DetectConflicts(detect_conflicts(
                &tasks,
                &dependencies,
                &allocations,
                config,
            )),
            AnalysisRequest::LevelResources {
                tasks,
                resources,
                allocations,
                floats,
            } => AnalysisResponse::LevelResources(level_resources(
                &tasks,
                &resources,
                &allocations,
                floats.as_ref(),
                config,
            )),
            AnalysisRequest::ApplyLeveling { tasks, proposals } => {
                AnalysisResponse::ApplyLeveling(apply_leveling(&tasks, &proposals))
            }
            AnalysisRequest::AnalyzeWorkload {
                tasks,
                resources,
                allocations,
            } => AnalysisResponse::AnalyzeWorkload(analyze_workload(
                &tasks,
                &resources,
                &allocations,
                config,
            )),
            AnalysisRequest::AnalyzeResourceUtilization {
                tasks,
                resources,
                allocations,
            } => AnalysisResponse::AnalyzeResourceUtilization(analyze_resource_utilization(
                &tasks,
                &resources,
                &allocations,
                config,
            )),
            AnalysisRequest::CreateBaseline {
                project_id,
                name,
                tasks,
                dependencies,
                baseline_date,
            } => {
                let date = baseline_date.unwrap_or_else(|| Utc::now().naive_utc());
                AnalysisResponse::CreateBaseline(create_baseline(
                    &project_id,
                    &name,
                    &tasks,
                    &dependencies,
                    date,
                )?)
            }
            AnalysisRequest::AnalyzeVariance { baseline, tasks } => {
                AnalysisResponse::AnalyzeVariance(analyze_variance(&baseline, &tasks))
            }
            AnalysisRequest::CompareBaselines { first, second } => {
                AnalysisResponse::CompareBaselines(compare_baselines(&first, &second))
            }
            AnalysisRequest::OptimizeSchedule {
                tasks,
                dependencies,
                resources,
            } => AnalysisResponse::OptimizeSchedule(optimize_schedule(
                &tasks,
                &dependencies,
                &resources,
                config,
            )),
        };
        Ok(response)
    }

    /// Run a JSON-encoded request and return the JSON-encoded response.
    pub fn execute_json(&self, request: &str) -> Result<String, EngineError> {
        let request: AnalysisRequest = serde_json::from_str(request)?;
        let response = self.execute(request)?;
        Ok(serde_json::to_string(&response)?)
    }
}
